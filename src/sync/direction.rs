//! Relay directions

use std::fmt;

/// One of the two fixed relay paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Events from tracker A replicated onto tracker B
    AToB,
    /// Events from tracker B replicated onto tracker A
    BToA,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::AToB, Direction::BToA];

    /// Label of the tracker events come from
    pub fn source_label(self) -> &'static str {
        match self {
            Direction::AToB => "A",
            Direction::BToA => "B",
        }
    }

    /// Label of the tracker events are relayed to
    pub fn dest_label(self) -> &'static str {
        self.opposite().source_label()
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::AToB => Direction::BToA,
            Direction::BToA => Direction::AToB,
        }
    }

    /// Stable identifier used in logs and lock keys
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::AToB => "AtoB",
            Direction::BToA => "BtoA",
        }
    }

    /// Order a (source, destination) key pair as (tracker A key, tracker B key)
    pub fn orient<'k>(self, source_key: &'k str, dest_key: &'k str) -> (&'k str, &'k str) {
        match self {
            Direction::AToB => (source_key, dest_key),
            Direction::BToA => (dest_key, source_key),
        }
    }

    /// Webhook path suffix for this direction
    pub fn route_segment(self) -> &'static str {
        match self {
            Direction::AToB => "A-to-B",
            Direction::BToA => "B-to-A",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source_label(), self.dest_label())
    }
}
