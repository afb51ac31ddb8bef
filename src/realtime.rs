use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::EventFeed;

pub const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// Tables anybody in the app reacts to when they change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedTable {
    Teams,
    Matches,
    Drinks,
    ChallengeAssignments,
    HidalgoCheckins,
    EventsFeed,
}

impl WatchedTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            WatchedTable::Teams => "teams",
            WatchedTable::Matches => "matches",
            WatchedTable::Drinks => "drinks",
            WatchedTable::ChallengeAssignments => "challenge_assignments",
            WatchedTable::HidalgoCheckins => "hidalgo_checkins",
            WatchedTable::EventsFeed => "events_feed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row-level change as reported by the backend. Consumers treat it as
/// a refetch trigger; only the events feed reads the payload itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TableChange {
    pub table: WatchedTable,
    pub kind: ChangeKind,
    pub row: serde_json::Value,
}

/// Fan-out point for table changes. Every subscriber gets every change;
/// slow subscribers fall behind and resync on their next refetch.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<TableChange>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::with_capacity(CHANGE_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        ChangeHub { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.sender.subscribe()
    }

    /// Best effort: with nobody listening the change is dropped.
    pub fn publish(&self, change: TableChange) {
        let _ = self.sender.send(change);
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a live feed row out of a change, for the ticker display. Only
/// inserts on events_feed qualify; anything else is refetch noise.
pub fn feed_event(change: &TableChange) -> Option<EventFeed> {
    if change.table != WatchedTable::EventsFeed || change.kind != ChangeKind::Insert {
        return None;
    }
    serde_json::from_value(change.row.clone()).ok()
}
