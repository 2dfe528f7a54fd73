use super::actor::TableActor;
use super::actor::TableTiming;
use super::message::TableMsg;
use super::protocol::Ack;
use super::protocol::ClientCommand;
use super::reconnect::ReconnectConfig;
use super::reconnect::ReconnectStore;
use super::sinks::BroadcastSink;
use super::sinks::Entropy;
use pit_engine::EngineError;
use pit_engine::PlayerId;
use pit_engine::TableConfig;
use pit_engine::TableId;
use pit_records::PersistenceSink;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Manages live tables and routes everything to their tasks.
///
/// The process-wide pieces (the reconnect store, the sinks, the entropy
/// source) are explicit collaborators handed in at construction and shared
/// by every table task. The coordinator itself never touches game state.
pub struct Coordinator {
    timing: TableTiming,
    broadcast: Arc<dyn BroadcastSink>,
    persistence: Arc<dyn PersistenceSink>,
    entropy: Arc<dyn Entropy>,
    reconnect: Arc<ReconnectStore>,
    tables: RwLock<HashMap<TableId, TableHandle>>,
    closed: AtomicBool,
}

struct TableHandle {
    tx: UnboundedSender<TableMsg>,
    task: JoinHandle<()>,
}

impl Coordinator {
    pub fn new(
        timing: TableTiming,
        reconnect_config: ReconnectConfig,
        token_secret: impl Into<Vec<u8>>,
        broadcast: Arc<dyn BroadcastSink>,
        persistence: Arc<dyn PersistenceSink>,
        entropy: Arc<dyn Entropy>,
    ) -> Self {
        Self {
            timing,
            broadcast,
            persistence,
            entropy,
            reconnect: Arc::new(ReconnectStore::new(token_secret, reconnect_config)),
            tables: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }
    pub fn reconnect_store(&self) -> Arc<ReconnectStore> {
        self.reconnect.clone()
    }

    /// Opens a table and spawns its task.
    pub async fn open_table(&self, config: TableConfig) -> Result<TableId, EngineError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable);
        }
        config
            .validate()
            .map_err(|e| EngineError::IllegalAction(e.to_string()))?;
        let table = TableId::default();
        let (tx, task) = TableActor::spawn(
            table,
            config,
            self.timing,
            self.broadcast.clone(),
            self.persistence.clone(),
            self.entropy.clone(),
            self.reconnect.clone(),
        );
        self.tables
            .write()
            .await
            .insert(table, TableHandle { tx, task });
        log::info!("[coordinator] opened table {}", table);
        Ok(table)
    }

    /// Routes a client command into the table's mailbox and waits for the
    /// acknowledgement.
    pub async fn command(&self, table: TableId, player: PlayerId, command: ClientCommand) -> Ack {
        if self.closed.load(Ordering::SeqCst) {
            return EngineError::Unavailable.into();
        }
        let (reply, rx) = oneshot::channel();
        match self.send(table, TableMsg::Command { player, command, reply }).await {
            Ok(()) => rx.await.unwrap_or_else(|_| EngineError::Unavailable.into()),
            Err(e) => e.into(),
        }
    }

    /// Transport lost this player; returns their signed reconnect token.
    pub async fn disconnect(
        &self,
        table: TableId,
        player: PlayerId,
    ) -> Result<String, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(table, TableMsg::Disconnect { player, reply }).await?;
        rx.await.map_err(|_| EngineError::Unavailable)?
    }

    /// A returning player presents their token; on success the
    /// reconciliation payload goes out on their room.
    pub async fn reconnect(&self, table: TableId, player: PlayerId, token: String) -> Ack {
        let (reply, rx) = oneshot::channel();
        match self.send(table, TableMsg::Reconnect { player, token, reply }).await {
            Ok(()) => rx.await.unwrap_or_else(|_| EngineError::Unavailable.into()),
            Err(e) => e.into(),
        }
    }

    /// Stops every table: pending timers cancelled, final snapshots
    /// persisted, and all further requests refused with `Unavailable`.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut tables = self.tables.write().await;
        for (table, handle) in tables.drain() {
            let _ = handle.tx.send(TableMsg::Shutdown);
            if handle.task.await.is_err() {
                log::warn!("[coordinator] table {} task panicked", table);
            }
        }
        log::info!("[coordinator] shut down");
    }

    async fn send(&self, table: TableId, msg: TableMsg) -> Result<(), EngineError> {
        let tables = self.tables.read().await;
        let handle = tables.get(&table).ok_or(EngineError::TableNotFound)?;
        handle.tx.send(msg).map_err(|_| EngineError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::broadcast::Broadcaster;
    use super::super::sinks::FixedEntropy;
    use super::super::sinks::MemoryBroadcast;
    use pit_core::Chips;
    use pit_engine::PlayerAction;
    use pit_records::MemorySink;
    use std::time::Duration;

    const SECRET: [u8; 32] = *b"0123456789abcdef0123456789abcdef";

    struct Fixture {
        coordinator: Coordinator,
        sink: Arc<MemoryBroadcast>,
        store: Arc<MemorySink>,
    }

    fn fixture() -> Fixture {
        let sink = Arc::new(MemoryBroadcast::new());
        let store = Arc::new(MemorySink::new());
        let coordinator = Coordinator::new(
            TableTiming::default(),
            ReconnectConfig::default(),
            SECRET,
            sink.clone(),
            store.clone(),
            Arc::new(FixedEntropy([7; 32])),
        );
        Fixture {
            coordinator,
            sink,
            store,
        }
    }

    async fn seated_table(fixture: &Fixture, stacks: &[Chips]) -> (TableId, Vec<PlayerId>) {
        let table = fixture
            .coordinator
            .open_table(TableConfig::default())
            .await
            .unwrap();
        let mut players = Vec::new();
        for (seat, stack) in stacks.iter().enumerate() {
            let player = PlayerId::default();
            let ack = fixture
                .coordinator
                .command(
                    table,
                    player,
                    ClientCommand::JoinTable {
                        name: format!("p{}", seat),
                        seat,
                        stack: *stack,
                    },
                )
                .await;
            assert!(ack.is_ok(), "{:?}", ack);
            players.push(player);
        }
        (table, players)
    }

    fn act(action: PlayerAction) -> ClientCommand {
        ClientCommand::PlayerAction { action }
    }

    /// Last state the room-wide channel saw.
    fn last_state(fixture: &Fixture, table: TableId) -> serde_json::Value {
        fixture
            .sink
            .for_room(&Broadcaster::table_room(table))
            .iter()
            .rev()
            .find(|(e, _)| e == "state_update")
            .map(|(_, p)| p.clone())
            .expect("a state update")
    }

    fn to_act(fixture: &Fixture, table: TableId) -> PlayerId {
        let state = last_state(fixture, table);
        let id = state["state"]["to_act"].as_str().expect("someone to act");
        PlayerId::from(uuid::Uuid::parse_str(id).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn commands_to_unknown_tables_bounce() {
        let fixture = fixture();
        let ack = fixture
            .coordinator
            .command(TableId::default(), PlayerId::default(), ClientCommand::StartHand)
            .await;
        assert_eq!(ack.code.as_deref(), Some("TableNotFound"));
    }

    #[tokio::test(start_paused = true)]
    async fn a_full_hand_flows_through_the_mailbox() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        let host = players[0];
        assert!(fixture.coordinator.command(table, host, ClientCommand::StartHand).await.is_ok());
        // heads-up: dealer acts first preflop
        let first = to_act(&fixture, table);
        assert!(fixture.coordinator.command(table, first, act(PlayerAction::Call)).await.is_ok());
        let second = to_act(&fixture, table);
        assert!(fixture.coordinator.command(table, second, act(PlayerAction::Check)).await.is_ok());
        let state = last_state(&fixture, table);
        assert_eq!(state["state"]["stage"], "flop");
        // acting out of turn is refused
        let wrong = players.iter().copied().find(|p| *p != to_act(&fixture, table)).unwrap();
        let ack = fixture.coordinator.command(table, wrong, act(PlayerAction::Check)).await;
        assert_eq!(ack.code.as_deref(), Some("NotYourTurn"));
        // check the hand down to completion
        loop {
            let state = last_state(&fixture, table);
            if state["state"]["to_act"].is_null() {
                break;
            }
            let actor = to_act(&fixture, table);
            assert!(fixture.coordinator.command(table, actor, act(PlayerAction::Check)).await.is_ok());
        }
        let state = last_state(&fixture, table);
        assert_eq!(state["state"]["stage"], "complete");
        assert_eq!(state["state"]["pot"], 0);
        // the hand end was announced and a snapshot persisted
        let events = fixture.sink.for_room(&Broadcaster::table_room(table));
        assert!(events.iter().any(|(e, _)| e == "hand_end"));
        tokio::task::yield_now().await;
        assert!(fixture.store.snapshot_count() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn turn_timeout_folds_or_checks() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        fixture.coordinator.command(table, players[0], ClientCommand::StartHand).await;
        let first = to_act(&fixture, table);
        // facing the big blind, silence folds after 15 s
        tokio::time::sleep(Duration::from_secs(16)).await;
        let room = Broadcaster::table_room(table);
        let auto = fixture
            .sink
            .for_room(&room)
            .into_iter()
            .find(|(e, p)| e == "player_action" && p["auto"] == true)
            .expect("an auto action");
        assert_eq!(auto.1["action"]["type"], "fold");
        assert_eq!(auto.1["player"], serde_json::json!(first.to_string()));
        let state = last_state(&fixture, table);
        assert_eq!(state["state"]["stage"], "complete");
    }

    #[tokio::test(start_paused = true)]
    async fn time_bank_extends_the_clock_to_seventy_five_seconds() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        fixture.coordinator.command(table, players[0], ClientCommand::StartHand).await;
        let first = to_act(&fixture, table);
        let ack = fixture.coordinator.command(table, first, ClientCommand::UseTimebank).await;
        assert!(ack.is_ok(), "{:?}", ack);
        // 15 s default + 60 s bank: still their turn at 74 s
        tokio::time::sleep(Duration::from_secs(74)).await;
        assert_eq!(to_act(&fixture, table), first);
        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = last_state(&fixture, table);
        assert_eq!(state["state"]["stage"], "complete");
        // a second bank use in the same turn is refused
        let ack = fixture.coordinator.command(table, first, ClientCommand::UseTimebank).await;
        assert!(!ack.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_runout_reveals_on_the_five_second_cadence() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        fixture.coordinator.command(table, players[0], ClientCommand::StartHand).await;
        let first = to_act(&fixture, table);
        fixture.coordinator.command(table, first, act(PlayerAction::Raise { amount: 500 })).await;
        let second = to_act(&fixture, table);
        let ack = fixture.coordinator.command(table, second, act(PlayerAction::Call)).await;
        assert!(ack.is_ok());
        // a prompt went out; decline it so the single board runs
        let room = Broadcaster::table_room(table);
        let prompt = fixture
            .sink
            .for_room(&room)
            .into_iter()
            .find(|(e, _)| e == "rit_prompt")
            .expect("a rit prompt");
        let decider =
            PlayerId::from(uuid::Uuid::parse_str(prompt.1["player"].as_str().unwrap()).unwrap());
        // actions while locked bounce with HandLocked
        let ack = fixture.coordinator.command(table, first, act(PlayerAction::Check)).await;
        assert_eq!(ack.code.as_deref(), Some("WaitingOnRIT"));
        fixture.coordinator.command(table, decider, ClientCommand::DeclineRunItTwice).await;
        let ack = fixture.coordinator.command(table, first, act(PlayerAction::Check)).await;
        assert_eq!(ack.code.as_deref(), Some("HandLocked"));
        let board_len = |fixture: &Fixture| {
            last_state(fixture, table)["state"]["board"]
                .as_array()
                .map(|b| b.len())
                .unwrap_or(0)
        };
        assert_eq!(board_len(&fixture), 0);
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(board_len(&fixture), 3);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(board_len(&fixture), 4);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(board_len(&fixture), 5);
        // one more gap, then showdown settles
        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = last_state(&fixture, table);
        assert_eq!(state["state"]["stage"], "complete");
        let total: i64 = state["state"]["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["stack"].as_i64().unwrap())
            .sum();
        assert_eq!(total, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn run_it_twice_settles_and_records_outcomes() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        fixture.coordinator.command(table, players[0], ClientCommand::StartHand).await;
        let first = to_act(&fixture, table);
        fixture.coordinator.command(table, first, act(PlayerAction::Raise { amount: 500 })).await;
        let second = to_act(&fixture, table);
        fixture.coordinator.command(table, second, act(PlayerAction::Call)).await;
        let room = Broadcaster::table_room(table);
        let prompt = fixture
            .sink
            .for_room(&room)
            .into_iter()
            .find(|(e, _)| e == "rit_prompt")
            .expect("a rit prompt");
        let decider =
            PlayerId::from(uuid::Uuid::parse_str(prompt.1["player"].as_str().unwrap()).unwrap());
        let ack = fixture
            .coordinator
            .command(table, decider, ClientCommand::EnableRunItTwice { runs: 2 })
            .await;
        assert!(ack.is_ok(), "{:?}", ack);
        // no single-board reveals with rit on: one gap, then execution
        tokio::time::sleep(Duration::from_secs(6)).await;
        let state = last_state(&fixture, table);
        assert_eq!(state["state"]["stage"], "complete");
        let total: i64 = state["state"]["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["stack"].as_i64().unwrap())
            .sum();
        assert_eq!(total, 1000);
        tokio::task::yield_now().await;
        let outcomes = fixture.store.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].board_number, 1);
        assert_eq!(outcomes[1].board_number, 2);
        assert_eq!(outcomes[0].pot_amount + outcomes[1].pot_amount, 1000);
        // the two boards are disjoint
        assert!(outcomes[0]
            .community_cards
            .iter()
            .all(|c| !outcomes[1].community_cards.contains(c)));
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_within_grace_cancels_the_auto_fold() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        fixture.coordinator.command(table, players[0], ClientCommand::StartHand).await;
        let first = to_act(&fixture, table);
        let token = fixture.coordinator.disconnect(table, first).await.unwrap();
        // their 60 s bank delays the auto action well past the reconnect
        tokio::time::sleep(Duration::from_secs(2)).await;
        let ack = fixture.coordinator.reconnect(table, first, token).await;
        assert!(ack.is_ok(), "{:?}", ack);
        let personal = fixture.sink.for_room(&Broadcaster::player_room(table, first));
        let reconcile = personal
            .iter()
            .rev()
            .find(|(e, _)| e == "reconcile")
            .expect("a reconcile payload");
        assert!(reconcile.1["grace_remaining_ms"].as_u64().unwrap() > 0);
        assert!(reconcile.1["missed"].as_array().is_some());
        // no auto action fires later: the player is still on the clock
        tokio::time::sleep(Duration::from_secs(10)).await;
        let room_events = fixture.sink.for_room(&Broadcaster::table_room(table));
        assert!(!room_events.iter().any(|(e, p)| e == "player_action" && p["auto"] == true));
        assert_eq!(to_act(&fixture, table), first);
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_replays_missed_actions() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500, 500]).await;
        fixture.coordinator.command(table, players[0], ClientCommand::StartHand).await;
        // the big blind (not to act) disconnects, misses two actions
        let state = last_state(&fixture, table);
        let seated: Vec<PlayerId> = state["state"]["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| PlayerId::from(uuid::Uuid::parse_str(p["id"].as_str().unwrap()).unwrap()))
            .collect();
        let bb = seated[2];
        let token = fixture.coordinator.disconnect(table, bb).await.unwrap();
        let utg = to_act(&fixture, table);
        fixture.coordinator.command(table, utg, act(PlayerAction::Call)).await;
        let sb = to_act(&fixture, table);
        fixture.coordinator.command(table, sb, act(PlayerAction::Call)).await;
        let ack = fixture.coordinator.reconnect(table, bb, token).await;
        assert!(ack.is_ok());
        let personal = fixture.sink.for_room(&Broadcaster::player_room(table, bb));
        let reconcile = personal
            .iter()
            .rev()
            .find(|(e, _)| e == "reconcile")
            .expect("a reconcile payload");
        let missed = reconcile.1["missed"].as_array().unwrap();
        assert_eq!(missed.len(), 2);
        assert_eq!(missed[0]["action"]["type"], "call");
        // ordered by sequence
        assert!(missed[0]["sequence"].as_u64() < missed[1]["sequence"].as_u64());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_refuses_further_work() {
        let fixture = fixture();
        let (table, players) = seated_table(&fixture, &[500, 500]).await;
        fixture.coordinator.shutdown().await;
        let ack = fixture
            .coordinator
            .command(table, players[0], ClientCommand::StartHand)
            .await;
        assert_eq!(ack.code.as_deref(), Some("Unavailable"));
        // the final snapshot made it out
        assert!(fixture.store.latest_snapshot(table).is_some());
    }
}
