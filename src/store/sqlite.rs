//! SQLite mapping store implementation

use crate::sync::Direction;
use crate::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long a call waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A persisted issue correspondence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMapping {
    pub key_a: String,
    pub key_b: String,
    pub created_at: String,
}

/// A persisted attachment correspondence, keyed by (source_url, source_attachment_id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentMapping {
    pub source_url: String,
    pub source_issue_key: String,
    pub source_attachment_id: String,
    pub dest_url: String,
    pub dest_issue_key: String,
    pub dest_attachment_id: String,
}

/// Where a source attachment was copied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentTarget {
    pub dest_url: String,
    pub dest_issue_key: String,
    pub dest_attachment_id: String,
}

/// Store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub issue_mappings: usize,
    pub attachment_mappings: usize,
}

/// Durable issue and attachment mappings between the two trackers
///
/// Holds only the database path. Every operation opens its own connection,
/// runs in its own transaction and closes the connection before returning,
/// so the store can be shared freely between concurrent event handlers.
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    /// Open or create the mapping database
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "Opening mapping database");

        let store = Self { path };
        store.init_schema()?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;

        // WAL lets lookups proceed while another handler is writing
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS issue_map (
                jira_a_key TEXT UNIQUE,
                jira_b_key TEXT UNIQUE,
                created_at TEXT NOT NULL,
                PRIMARY KEY (jira_a_key, jira_b_key)
            );

            CREATE TABLE IF NOT EXISTS attachment_map (
                source_jira TEXT NOT NULL,
                source_issue_key TEXT NOT NULL,
                source_attachment_id TEXT NOT NULL,
                dest_jira TEXT NOT NULL,
                dest_issue_key TEXT NOT NULL,
                dest_attachment_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (source_jira, source_attachment_id)
            );
            "#,
        )?;

        Ok(())
    }

    /// Record that `key_a` on tracker A and `key_b` on tracker B are the same issue.
    ///
    /// Insert-or-replace: any existing row sharing either key is overwritten.
    pub fn upsert_issue_mapping(&self, key_a: &str, key_b: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO issue_map (jira_a_key, jira_b_key, created_at) VALUES (?, ?, ?)",
            params![key_a, key_b, Utc::now().to_rfc3339()],
        )?;

        tracing::debug!(key_a = %key_a, key_b = %key_b, "Stored issue mapping");
        Ok(())
    }

    /// Record a mapping only if neither key is mapped yet.
    ///
    /// Returns `false` when an existing row already holds either key.
    pub fn insert_issue_mapping_if_absent(&self, key_a: &str, key_b: &str) -> Result<bool> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO issue_map (jira_a_key, jira_b_key, created_at) VALUES (?, ?, ?)",
            params![key_a, key_b, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted == 1)
    }

    /// Counterpart of `key` on the destination side of `direction`
    pub fn lookup_dest_issue(&self, key: &str, direction: Direction) -> Result<Option<String>> {
        let sql = match direction {
            Direction::AToB => "SELECT jira_b_key FROM issue_map WHERE jira_a_key = ?",
            Direction::BToA => "SELECT jira_a_key FROM issue_map WHERE jira_b_key = ?",
        };

        let conn = self.connect()?;
        let dest = conn
            .query_row(sql, [key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(dest)
    }

    /// Record where a source attachment was copied to.
    ///
    /// Insert-or-replace keyed by (source_url, source_attachment_id).
    pub fn upsert_attachment_mapping(&self, mapping: &AttachmentMapping) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO attachment_map (
                source_jira, source_issue_key, source_attachment_id,
                dest_jira, dest_issue_key, dest_attachment_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                &mapping.source_url,
                &mapping.source_issue_key,
                &mapping.source_attachment_id,
                &mapping.dest_url,
                &mapping.dest_issue_key,
                &mapping.dest_attachment_id,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            source = %mapping.source_url,
            attachment = %mapping.source_attachment_id,
            dest_attachment = %mapping.dest_attachment_id,
            "Stored attachment mapping"
        );
        Ok(())
    }

    /// Look up where a source attachment was copied to, if anywhere
    pub fn lookup_attachment_mapping(
        &self,
        source_url: &str,
        source_attachment_id: &str,
    ) -> Result<Option<AttachmentTarget>> {
        let conn = self.connect()?;
        let target = conn
            .query_row(
                r#"
                SELECT dest_jira, dest_issue_key, dest_attachment_id
                FROM attachment_map
                WHERE source_jira = ? AND source_attachment_id = ?
                "#,
                params![source_url, source_attachment_id],
                |row| {
                    Ok(AttachmentTarget {
                        dest_url: row.get(0)?,
                        dest_issue_key: row.get(1)?,
                        dest_attachment_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(target)
    }

    /// Find the row whose upload produced `attachment_id` on the tracker at `url`.
    ///
    /// A copy made by the bridge is reported back by the tracker it landed on;
    /// this identifies it. Rows with an unknown destination id never match.
    pub fn lookup_attachment_copy(
        &self,
        url: &str,
        attachment_id: &str,
    ) -> Result<Option<AttachmentMapping>> {
        let conn = self.connect()?;
        let mapping = conn
            .query_row(
                r#"
                SELECT source_jira, source_issue_key, source_attachment_id,
                       dest_jira, dest_issue_key, dest_attachment_id
                FROM attachment_map
                WHERE dest_jira = ? AND dest_attachment_id = ? AND dest_attachment_id != ''
                "#,
                params![url, attachment_id],
                |row| {
                    Ok(AttachmentMapping {
                        source_url: row.get(0)?,
                        source_issue_key: row.get(1)?,
                        source_attachment_id: row.get(2)?,
                        dest_url: row.get(3)?,
                        dest_issue_key: row.get(4)?,
                        dest_attachment_id: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(mapping)
    }

    /// All issue mappings, oldest first
    pub fn list_issue_mappings(&self) -> Result<Vec<IssueMapping>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT jira_a_key, jira_b_key, created_at FROM issue_map ORDER BY created_at, jira_a_key",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(IssueMapping {
                key_a: row.get(0)?,
                key_b: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut mappings = Vec::new();
        for row in rows {
            mappings.push(row?);
        }
        Ok(mappings)
    }

    /// All attachment mappings, oldest first
    pub fn list_attachment_mappings(&self) -> Result<Vec<AttachmentMapping>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT source_jira, source_issue_key, source_attachment_id,
                   dest_jira, dest_issue_key, dest_attachment_id
            FROM attachment_map
            ORDER BY created_at, source_attachment_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(AttachmentMapping {
                source_url: row.get(0)?,
                source_issue_key: row.get(1)?,
                source_attachment_id: row.get(2)?,
                dest_url: row.get(3)?,
                dest_issue_key: row.get(4)?,
                dest_attachment_id: row.get(5)?,
            })
        })?;

        let mut mappings = Vec::new();
        for row in rows {
            mappings.push(row?);
        }
        Ok(mappings)
    }

    /// Row counts for both tables
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.connect()?;
        let issues: i64 = conn.query_row("SELECT COUNT(*) FROM issue_map", [], |row| row.get(0))?;
        let attachments: i64 =
            conn.query_row("SELECT COUNT(*) FROM attachment_map", [], |row| row.get(0))?;

        Ok(StoreStats {
            issue_mappings: issues as usize,
            attachment_mappings: attachments as usize,
        })
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
