use super::protocol::LoggedAction;
use pit_core::Millis;
use pit_core::Seq;
use pit_engine::EngineError;
use pit_engine::PlayerId;
use pit_engine::TableId;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Disconnect-recovery configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    /// How long a dropped player can return without forfeiting.
    pub grace_timeout: Duration,
    /// Bound on the per-table missed-action log.
    pub max_history: usize,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            grace_timeout: Duration::from_secs(30),
            max_history: 100,
        }
    }
}

/// Signed reconnect-token claims.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: uuid::Uuid,
    tbl: uuid::Uuid,
    iat: i64,
    exp: i64,
}

impl Claims {
    /// Tokens outlive the grace window: late reconnects still resync, they
    /// just find their auto-action already committed.
    const VALIDITY: Duration = Duration::from_secs(3600);

    fn new(player: PlayerId, table: TableId) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_secs() as i64;
        Self {
            sub: player.inner(),
            tbl: table.inner(),
            iat: now,
            exp: now + Self::VALIDITY.as_secs() as i64,
        }
    }
}

/// What a verified reconnect gets back, besides the full state the actor
/// attaches.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectGrant {
    pub grace_remaining_ms: Millis,
    pub missed: Vec<LoggedAction>,
}

#[derive(Debug, Clone, Copy)]
struct Disconnect {
    grace_until: Instant,
    auto_at: Option<Instant>,
    since_seq: Seq,
}

#[derive(Debug, Default)]
struct Inner {
    disconnects: HashMap<(TableId, PlayerId), Disconnect>,
    logs: HashMap<TableId, VecDeque<LoggedAction>>,
}

/// Process-wide disconnect bookkeeping.
///
/// One store serves every table: tokens are signed with a single secret,
/// and the per-table action logs are bounded FIFO. All operations are
/// atomic behind one lock; table loops only ever take it briefly.
#[derive(Debug)]
pub struct ReconnectStore {
    secret: Vec<u8>,
    config: ReconnectConfig,
    inner: Mutex<Inner>,
}

impl ReconnectStore {
    pub fn new(secret: impl Into<Vec<u8>>, config: ReconnectConfig) -> Self {
        Self {
            secret: secret.into(),
            config,
            inner: Mutex::new(Inner::default()),
        }
    }
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Records a disconnect and returns the signed reconnect token.
    ///
    /// When it was the player's turn, an auto-action is scheduled at
    /// `max(5 s, their time bank)`; reconnecting cancels it.
    pub fn disconnect(
        &self,
        table: TableId,
        player: PlayerId,
        their_turn: bool,
        time_bank_ms: Millis,
        sequence: Seq,
        now: Instant,
    ) -> String {
        let auto_at = their_turn.then(|| {
            now + Duration::from_millis(time_bank_ms).max(Duration::from_secs(5))
        });
        let record = Disconnect {
            grace_until: now + self.config.grace_timeout,
            auto_at,
            since_seq: sequence,
        };
        self.inner
            .lock()
            .expect("reconnect lock")
            .disconnects
            .insert((table, player), record);
        log::debug!("[reconnect] {} dropped from {}", player, table);
        jsonwebtoken::encode(
            &Header::default(),
            &Claims::new(player, table),
            &EncodingKey::from_secret(&self.secret),
        )
        .expect("sign reconnect token")
    }

    /// Verifies a token and closes the disconnect window: the pending
    /// auto-action is cancelled and the missed actions are replayed.
    pub fn reconnect(
        &self,
        table: TableId,
        player: PlayerId,
        token: &str,
        now: Instant,
    ) -> Result<ReconnectGrant, EngineError> {
        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )
        .map_err(|_| EngineError::IllegalAction("invalid reconnect token".into()))?
        .claims;
        if claims.sub != player.inner() || claims.tbl != table.inner() {
            return Err(EngineError::IllegalAction("token mismatch".into()));
        }
        let mut inner = self.inner.lock().expect("reconnect lock");
        let record = inner.disconnects.remove(&(table, player));
        let (grace_remaining_ms, since) = match record {
            Some(r) => (
                r.grace_until.saturating_duration_since(now).as_millis() as Millis,
                r.since_seq,
            ),
            None => (0, 0),
        };
        let missed = inner
            .logs
            .get(&table)
            .map(|log| {
                log.iter()
                    .filter(|a| a.sequence > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        log::debug!("[reconnect] {} rejoined {}", player, table);
        Ok(ReconnectGrant {
            grace_remaining_ms,
            missed,
        })
    }

    /// Appends to the table's missed-action log, dropping the oldest
    /// entries past the cap.
    pub fn record_action(&self, table: TableId, entry: LoggedAction) {
        let mut inner = self.inner.lock().expect("reconnect lock");
        let log = inner.logs.entry(table).or_default();
        log.push_back(entry);
        while log.len() > self.config.max_history {
            log.pop_front();
        }
    }

    /// Players whose grace has elapsed by `now`, removed from the store;
    /// the table's action manager commits their auto-action.
    pub fn check_timeouts(&self, now: Instant) -> Vec<(TableId, PlayerId)> {
        let mut inner = self.inner.lock().expect("reconnect lock");
        let expired: Vec<(TableId, PlayerId)> = inner
            .disconnects
            .iter()
            .filter(|(_, r)| now >= r.grace_until)
            .map(|(k, _)| *k)
            .collect();
        for key in &expired {
            inner.disconnects.remove(key);
        }
        expired
    }

    /// Grace expiries for one table only, removed from the store. The
    /// table loop sweeps itself; [`check_timeouts`](Self::check_timeouts)
    /// is the process-wide sweep.
    pub fn timeouts_for(&self, table: TableId, now: Instant) -> Vec<PlayerId> {
        let mut inner = self.inner.lock().expect("reconnect lock");
        let expired: Vec<PlayerId> = inner
            .disconnects
            .iter()
            .filter(|((t, _), r)| *t == table && now >= r.grace_until)
            .map(|((_, p), _)| *p)
            .collect();
        for player in &expired {
            inner.disconnects.remove(&(table, *player));
        }
        expired
    }

    /// Disconnected players of one table whose turn-bound auto-action is
    /// due. One-shot: returned players fire once.
    pub fn auto_actions_due(&self, table: TableId, now: Instant) -> Vec<PlayerId> {
        let mut inner = self.inner.lock().expect("reconnect lock");
        let mut due = Vec::new();
        for ((t, player), record) in inner.disconnects.iter_mut() {
            if *t == table && record.auto_at.map(|at| now >= at).unwrap_or(false) {
                record.auto_at = None;
                due.push(*player);
            }
        }
        due
    }

    /// Whether this player is currently within a disconnect window.
    pub fn is_disconnected(&self, table: TableId, player: PlayerId) -> bool {
        self.inner
            .lock()
            .expect("reconnect lock")
            .disconnects
            .contains_key(&(table, player))
    }

    /// The earliest wake this table needs for disconnect handling.
    pub fn next_wake(&self, table: TableId) -> Option<Instant> {
        let inner = self.inner.lock().expect("reconnect lock");
        inner
            .disconnects
            .iter()
            .filter(|((t, _), _)| *t == table)
            .flat_map(|(_, r)| [Some(r.grace_until), r.auto_at])
            .flatten()
            .min()
    }
}
