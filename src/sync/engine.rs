//! The sync engine
//!
//! Owns both tracker clients, the mapping store and the issue-creation locks.
//! One engine serves both directions; [`SyncEngine::context`] picks the
//! source/destination pairing for a direction.

use super::locks::KeyedLocks;
use super::Direction;
use crate::config::BridgeConfig;
use crate::store::MappingStore;
use crate::tracker::{JiraClient, TrackerClient};
use crate::Result;
use std::sync::Arc;

/// Everything a handler needs for one event in one direction
pub struct SyncContext<'a> {
    pub direction: Direction,
    pub source: &'a dyn TrackerClient,
    pub dest: &'a dyn TrackerClient,
    pub store: &'a MappingStore,
    pub issue_locks: &'a KeyedLocks,
}

impl SyncContext<'_> {
    /// Counterpart of a source issue on the destination, if it was synced
    pub fn dest_issue(&self, source_key: Option<&str>) -> Result<Option<String>> {
        match source_key {
            Some(key) => self.store.lookup_dest_issue(key, self.direction),
            None => Ok(None),
        }
    }
}

/// Bidirectional sync engine
pub struct SyncEngine {
    tracker_a: Arc<dyn TrackerClient>,
    tracker_b: Arc<dyn TrackerClient>,
    store: MappingStore,
    issue_locks: KeyedLocks,
}

impl SyncEngine {
    pub fn new(
        tracker_a: Arc<dyn TrackerClient>,
        tracker_b: Arc<dyn TrackerClient>,
        store: MappingStore,
    ) -> Self {
        Self {
            tracker_a,
            tracker_b,
            store,
            issue_locks: KeyedLocks::new(),
        }
    }

    /// Build Jira clients for both trackers and open the mapping store
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        let tracker_a = JiraClient::new(config.tracker_a.clone(), timeout)?;
        let tracker_b = JiraClient::new(config.tracker_b.clone(), timeout)?;
        let store = MappingStore::open(&config.storage.path)?;

        tracing::info!(
            tracker_a = %config.tracker_a.base_url(),
            tracker_b = %config.tracker_b.base_url(),
            db = %store.path().display(),
            "Sync engine ready"
        );

        Ok(Self::new(Arc::new(tracker_a), Arc::new(tracker_b), store))
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Source and destination pairing for a direction
    pub fn context(&self, direction: Direction) -> SyncContext<'_> {
        let (source, dest) = match direction {
            Direction::AToB => (self.tracker_a.as_ref(), self.tracker_b.as_ref()),
            Direction::BToA => (self.tracker_b.as_ref(), self.tracker_a.as_ref()),
        };

        SyncContext {
            direction,
            source,
            dest,
            store: &self.store,
            issue_locks: &self.issue_locks,
        }
    }
}
