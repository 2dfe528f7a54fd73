use super::outcome::RitOutcome;
use pit_engine::Snapshot;
use pit_engine::TableId;
use std::sync::Mutex;

/// Where engine state and outcome records go.
///
/// Implementations wrap whatever store the host runs. Errors are the
/// sink's to retry; callers treat every write as fire-and-forget and never
/// block table progress on one.
#[async_trait::async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persists the latest snapshot for a table, replacing any previous.
    async fn save_snapshot(&self, table: TableId, snapshot: &Snapshot);
    /// Appends one run-it-twice outcome record.
    async fn record_rit_outcome(&self, outcome: &RitOutcome);
}

/// A sink that drops everything. For hosts that only want live play.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait::async_trait]
impl PersistenceSink for NullSink {
    async fn save_snapshot(&self, _table: TableId, _snapshot: &Snapshot) {}
    async fn record_rit_outcome(&self, _outcome: &RitOutcome) {}
}

/// An in-memory sink for tests and local runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    snapshots: Mutex<Vec<(TableId, Snapshot)>>,
    outcomes: Mutex<Vec<RitOutcome>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
    /// The most recent snapshot per table wins.
    pub fn latest_snapshot(&self, table: TableId) -> Option<Snapshot> {
        self.snapshots
            .lock()
            .expect("sink lock")
            .iter()
            .rev()
            .find(|(t, _)| *t == table)
            .map(|(_, s)| s.clone())
    }
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().expect("sink lock").len()
    }
    pub fn outcomes(&self) -> Vec<RitOutcome> {
        self.outcomes.lock().expect("sink lock").clone()
    }
}

#[async_trait::async_trait]
impl PersistenceSink for MemorySink {
    async fn save_snapshot(&self, table: TableId, snapshot: &Snapshot) {
        self.snapshots
            .lock()
            .expect("sink lock")
            .push((table, snapshot.clone()));
    }
    async fn record_rit_outcome(&self, outcome: &RitOutcome) {
        // natural key (hand, board_number): replays are no-ops
        let mut outcomes = self.outcomes.lock().expect("sink lock");
        let duplicate = outcomes
            .iter()
            .any(|o| o.hand == outcome.hand && o.board_number == outcome.board_number);
        if duplicate {
            log::debug!("[records] duplicate rit outcome {}:{}", outcome.hand, outcome.board_number);
        } else {
            outcomes.push(outcome.clone());
        }
    }
}
