use super::protocol::ServerMessage;
use super::reconnect::ReconnectGrant;
use super::sanitize::sanitize;
use super::sinks::BroadcastSink;
use pit_core::Seq;
use pit_engine::Engine;
use pit_engine::EngineError;
use pit_engine::PlayerId;
use pit_engine::TableId;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Broadcast throttling configuration.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    pub max_updates_per_second: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            max_updates_per_second: 20,
        }
    }
}

/// Versioned state delivery for one table.
///
/// Every accepted `state_update` takes the next sequence number and fans
/// out one sanitised view per seated player plus the room-wide variant, so
/// no audience ever receives another player's concealed cards. Updates
/// beyond the per-second allowance are rejected *before* sequencing, so
/// the stream stays gapless; reconciliation traffic is never throttled.
pub struct Broadcaster {
    sink: Arc<dyn BroadcastSink>,
    config: BroadcastConfig,
    table: TableId,
    stamps: VecDeque<Instant>,
}

impl Broadcaster {
    pub fn new(sink: Arc<dyn BroadcastSink>, table: TableId, config: BroadcastConfig) -> Self {
        Self {
            sink,
            config,
            table,
            stamps: VecDeque::new(),
        }
    }
    /// The room a single player listens on.
    pub fn player_room(table: TableId, player: PlayerId) -> String {
        format!("table:{}:player:{}", table, player)
    }
    /// The room every spectator of a table listens on.
    pub fn table_room(table: TableId) -> String {
        format!("table:{}", table)
    }

    /// Emits the per-player deltas and the room-wide update for the
    /// engine's current state, assigning the next sequence number.
    pub async fn state_update(
        &mut self,
        engine: &mut Engine,
        now: Instant,
    ) -> Result<Seq, EngineError> {
        self.sweep(now);
        if self.stamps.len() >= self.config.max_updates_per_second {
            log::warn!("[broadcast {}] update rate exceeded", self.table);
            return Err(EngineError::RateLimited);
        }
        self.stamps.push_back(now);
        let sequence = engine.bump_sequence();
        let ids: Vec<PlayerId> = engine.state().players().iter().map(|p| p.id()).collect();
        for id in ids {
            let message = ServerMessage::StateUpdate {
                table: self.table,
                sequence,
                state: sanitize(engine.state(), Some(id)),
            };
            self.sink
                .deliver(
                    &Self::player_room(self.table, id),
                    message.event(),
                    message.to_json(),
                )
                .await;
        }
        let message = ServerMessage::StateUpdate {
            table: self.table,
            sequence,
            state: sanitize(engine.state(), None),
        };
        self.sink
            .deliver(
                &Self::table_room(self.table),
                message.event(),
                message.to_json(),
            )
            .await;
        Ok(sequence)
    }

    /// Full sanitised state plus missed actions for one reconnecting
    /// player. Does not consume a sequence number and is never throttled.
    pub async fn reconcile(&self, engine: &Engine, player: PlayerId, grant: &ReconnectGrant) {
        let message = ServerMessage::Reconcile {
            table: self.table,
            sequence: engine.state().sequence(),
            state: sanitize(engine.state(), Some(player)),
            grace_remaining_ms: grant.grace_remaining_ms,
            missed: grant.missed.clone(),
        };
        self.sink
            .deliver(
                &Self::player_room(self.table, player),
                message.event(),
                message.to_json(),
            )
            .await;
    }

    /// Sends an event to one player.
    pub async fn unicast(&self, player: PlayerId, message: ServerMessage) {
        self.sink
            .deliver(
                &Self::player_room(self.table, player),
                message.event(),
                message.to_json(),
            )
            .await;
    }
    /// Sends an event to the whole table.
    pub async fn announce(&self, message: ServerMessage) {
        self.sink
            .deliver(
                &Self::table_room(self.table),
                message.event(),
                message.to_json(),
            )
            .await;
    }

    /// Drops rate stamps older than the one-second window.
    fn sweep(&mut self, now: Instant) {
        let window = Duration::from_secs(1);
        while self
            .stamps
            .front()
            .map(|t| now.duration_since(*t) >= window)
            .unwrap_or(false)
        {
            self.stamps.pop_front();
        }
    }
}
