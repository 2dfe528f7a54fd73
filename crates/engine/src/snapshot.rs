use super::error::EngineError;
use super::flow::Engine;
use super::player::PlayerId;
use super::table::TableState;
use pit_cards::Deck;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeSet;

/// Bumped on any change to the persisted shape.
pub const SCHEMA_VERSION: u32 = 1;

/// A serialisable image of an engine, complete enough to resume play.
///
/// Restoring is a pure constructor: no clocks, no entropy. What is not
/// captured is deliberately transient. Poisoning is excluded because a
/// poisoned table is not snapshot-worthy, and the run-it-twice baseline
/// because the deck itself is the baseline once reveals stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub table_state: TableState,
    pub deck: Deck,
    pub removed_players: Vec<PlayerId>,
    pub rabbit_previewed: bool,
    pub rit_consents: BTreeSet<PlayerId>,
}

impl Engine {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            schema_version: SCHEMA_VERSION,
            table_state: self.state().clone(),
            deck: self.deck().clone(),
            removed_players: self.removed().to_vec(),
            rabbit_previewed: self.rabbit_previewed(),
            rit_consents: self.rit_consents().clone(),
        }
    }
    /// Rebuilds an engine from a snapshot. Pure; pairs with
    /// [`snapshot`](Self::snapshot).
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self::restore_parts(
            snapshot.table_state,
            snapshot.deck,
            snapshot.removed_players,
            snapshot.rabbit_previewed,
            snapshot.rit_consents,
        )
    }
    /// Restores from an untrusted JSON blob, validating the persisted
    /// shape first: a table-state object with a non-empty table id, a
    /// players array, numeric blinds, and a deck array. Anything else is a
    /// failed restore and the caller treats the table as absent.
    pub fn restore(value: &serde_json::Value) -> Result<Self, EngineError> {
        let corrupt = |what: &str| EngineError::Corrupt(format!("snapshot: {}", what));
        let table_state = value
            .get("table_state")
            .filter(|v| v.is_object())
            .ok_or_else(|| corrupt("table_state missing"))?;
        table_state
            .get("table")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| corrupt("empty table id"))?;
        table_state
            .get("players")
            .filter(|v| v.is_array())
            .ok_or_else(|| corrupt("players not an array"))?;
        let config = table_state
            .get("config")
            .filter(|v| v.is_object())
            .ok_or_else(|| corrupt("config missing"))?;
        for blind in ["small_blind", "big_blind"] {
            config
                .get(blind)
                .filter(|v| v.is_number())
                .ok_or_else(|| corrupt("blinds not numeric"))?;
        }
        value
            .get("deck")
            .filter(|v| v.is_array())
            .ok_or_else(|| corrupt("deck not an array"))?;
        let snapshot: Snapshot = serde_json::from_value(value.clone())
            .map_err(|e| corrupt(&e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::PlayerAction;
    use crate::flow::Progress;
    use crate::flow::tests::engine_with;
    use crate::flow::tests::seed;

    fn mid_hand_engine() -> Engine {
        let mut engine = engine_with(&[500, 500, 500]);
        engine.start_hand(seed(30), "ps".into()).unwrap();
        let utg = engine.state().players()[0].id();
        engine.submit(utg, PlayerAction::Raise { amount: 30 }).unwrap();
        engine
    }

    #[test]
    fn snapshot_round_trips_observable_state() {
        let engine = mid_hand_engine();
        let snapshot = engine.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        let restored = Engine::restore(&json).unwrap();
        assert_eq!(restored.state(), engine.state());
        assert_eq!(restored.deck(), engine.deck());
        assert_eq!(restored.removed(), engine.removed());
        assert_eq!(restored.rabbit_previewed(), engine.rabbit_previewed());
        assert_eq!(restored.rit_consents(), engine.rit_consents());
    }

    #[test]
    fn restored_engine_keeps_playing() {
        let engine = mid_hand_engine();
        let mut restored = Engine::from_snapshot(engine.snapshot());
        let sb = restored.state().players()[1].id();
        let bb = restored.state().players()[2].id();
        restored.submit(sb, PlayerAction::Fold).unwrap();
        assert_eq!(restored.submit(bb, PlayerAction::Fold).unwrap(), Progress::HandOver);
    }

    #[test]
    fn restore_rejects_malformed_blobs() {
        let engine = mid_hand_engine();
        let good = serde_json::to_value(engine.snapshot()).unwrap();

        let mut no_table = good.clone();
        no_table["table_state"]["table"] = serde_json::json!("");
        assert!(Engine::restore(&no_table).is_err());

        let mut bad_players = good.clone();
        bad_players["table_state"]["players"] = serde_json::json!("nope");
        assert!(Engine::restore(&bad_players).is_err());

        let mut bad_blind = good.clone();
        bad_blind["table_state"]["config"]["big_blind"] = serde_json::json!("ten");
        assert!(Engine::restore(&bad_blind).is_err());

        let mut bad_deck = good.clone();
        bad_deck["deck"] = serde_json::json!({});
        assert!(Engine::restore(&bad_deck).is_err());

        assert!(Engine::restore(&serde_json::json!({})).is_err());
    }

    #[test]
    fn snapshot_carries_schema_version() {
        let snapshot = mid_hand_engine().snapshot();
        assert_eq!(snapshot.schema_version, SCHEMA_VERSION);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["schema_version"], 1);
    }
}
