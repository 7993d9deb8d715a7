//! Provenance markers and loop prevention
//!
//! Every relayed comment and worklog note is tagged with the marker of the
//! direction it travelled. When the destination tracker notifies us about that
//! write, the text comes back on the opposite path still carrying the marker,
//! and [`is_echo`] drops it. Issues only get a human-readable note; their
//! loops are cut by the mapping store.

use super::Direction;

/// Appended to text relayed from A to B
pub const MARKER_A_TO_B: &str = "[SyncedFromA]";

/// Appended to text relayed from B to A
pub const MARKER_B_TO_A: &str = "[SyncedFromB]";

/// Marker written by relays travelling in `direction`
pub fn marker(direction: Direction) -> &'static str {
    match direction {
        Direction::AToB => MARKER_A_TO_B,
        Direction::BToA => MARKER_B_TO_A,
    }
}

/// Append the direction's marker on a new paragraph.
///
/// Text that already carries the marker is returned unchanged.
pub fn tag(body: &str, direction: Direction) -> String {
    let marker = marker(direction);
    if body.contains(marker) {
        return body.to_string();
    }
    format!("{}\n\n{}", body, marker)
}

/// True if `body` was written by a relay in the opposite direction
pub fn is_echo(body: &str, direction: Direction) -> bool {
    body.contains(marker(direction.opposite()))
}

/// Note appended to the description of relayed issues, e.g. `(Synced from A)`
pub fn issue_note(direction: Direction) -> String {
    format!("(Synced from {})", direction.source_label())
}

/// Description for the replica of an issue travelling in `direction`
pub fn relayed_description(description: &str, direction: Direction) -> String {
    format!("{}\n\n{}", description, issue_note(direction))
}
