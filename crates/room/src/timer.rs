use pit_core::Millis;
use pit_engine::PlayerId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Decision-clock and time-bank configuration.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub default_duration: Duration,
    pub warning_threshold: Duration,
    pub time_bank_initial: Duration,
    pub time_bank_max: Duration,
    pub replenish_amount: Duration,
    pub replenish_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration: Duration::from_secs(15),
            warning_threshold: Duration::from_secs(5),
            time_bank_initial: Duration::from_secs(60),
            time_bank_max: Duration::from_secs(120),
            replenish_amount: Duration::from_secs(15),
            replenish_interval: Duration::from_secs(30 * 60),
        }
    }
}

/// The single active turn timer of a table.
///
/// Pure deadline bookkeeping: the table loop asks what is due and when to
/// wake up; nothing in here fires on its own. A warning is emitted once per
/// turn when the remaining time crosses the threshold; consuming the time
/// bank extends the deadline by the entire balance and re-arms the warning.
#[derive(Debug)]
pub struct TurnClock {
    config: TimerConfig,
    player: Option<PlayerId>,
    deadline: Option<Instant>,
    warned: bool,
    bank_spent: bool,
}

impl TurnClock {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            player: None,
            deadline: None,
            warned: false,
            bank_spent: false,
        }
    }
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }
    /// (Re)arms the clock for a player's turn.
    pub fn start_turn(&mut self, player: PlayerId, now: Instant) {
        self.player = Some(player);
        self.deadline = Some(now + self.config.default_duration);
        self.warned = false;
        self.bank_spent = false;
    }
    pub fn stop_turn(&mut self) {
        self.player = None;
        self.deadline = None;
        self.warned = false;
        self.bank_spent = false;
    }
    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
    /// Extends the running turn by the player's whole bank. Fails unless it
    /// is this player's turn, the bank holds time, and it hasn't been spent
    /// this turn already.
    pub fn use_time_bank(&mut self, player: PlayerId, bank_ms: Millis, now: Instant) -> bool {
        if self.player != Some(player) || bank_ms == 0 || self.bank_spent {
            return false;
        }
        let base = self.deadline.unwrap_or(now).max(now);
        self.deadline = Some(base + Duration::from_millis(bank_ms));
        self.warned = false;
        self.bank_spent = true;
        true
    }
    /// The player whose clock just ran out, if any.
    pub fn expired(&self, now: Instant) -> Option<PlayerId> {
        match (self.player, self.deadline) {
            (Some(player), Some(deadline)) if now >= deadline => Some(player),
            _ => None,
        }
    }
    /// A warning to emit now: `(player, remaining)`. At most one per arm.
    pub fn warning_due(&mut self, now: Instant) -> Option<(PlayerId, Duration)> {
        let player = self.player?;
        let deadline = self.deadline?;
        let remaining = deadline.saturating_duration_since(now);
        if !self.warned && remaining <= self.config.warning_threshold && remaining > Duration::ZERO
        {
            self.warned = true;
            Some((player, remaining))
        } else {
            None
        }
    }
    /// When the loop should wake for this clock: the warning moment if
    /// still pending, else the deadline.
    pub fn next_wake(&self) -> Option<Instant> {
        let deadline = self.deadline?;
        if self.warned {
            Some(deadline)
        } else {
            Some(deadline - self.config.warning_threshold)
        }
    }
}

/// Per-player time-bank accrual.
///
/// Balances live on the engine's players (they persist in snapshots); this
/// tracks the replenishment schedule. Every elapsed interval grants the
/// configured amount up to the cap.
#[derive(Debug)]
pub struct TimeBanks {
    config: TimerConfig,
    last_grant: HashMap<PlayerId, Instant>,
}

impl TimeBanks {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config,
            last_grant: HashMap::new(),
        }
    }
    /// The starting balance for a freshly seated player.
    pub fn initial_ms(&self) -> Millis {
        self.config.time_bank_initial.as_millis() as Millis
    }
    pub fn register(&mut self, player: PlayerId, now: Instant) {
        self.last_grant.insert(player, now);
    }
    pub fn remove(&mut self, player: PlayerId) {
        self.last_grant.remove(&player);
    }
    /// Applies every replenishment due by `now`. Takes each player's
    /// current balance and returns the new one per updated player.
    pub fn tick_replenish(
        &mut self,
        now: Instant,
        balance_of: impl Fn(PlayerId) -> Millis,
    ) -> Vec<(PlayerId, Millis)> {
        let interval = self.config.replenish_interval;
        let amount = self.config.replenish_amount.as_millis() as Millis;
        let cap = self.config.time_bank_max.as_millis() as Millis;
        let mut updates = Vec::new();
        for (player, last) in self.last_grant.iter_mut() {
            let mut grants: Millis = 0;
            while now.duration_since(*last) >= interval {
                *last += interval;
                grants += 1;
            }
            if grants > 0 {
                let balance = balance_of(*player);
                let topped = cap.min(balance + grants * amount);
                if topped != balance {
                    updates.push((*player, topped));
                }
            }
        }
        updates
    }
    /// The earliest upcoming replenishment.
    pub fn next_wake(&self) -> Option<Instant> {
        self.last_grant
            .values()
            .map(|last| *last + self.config.replenish_interval)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> TurnClock {
        TurnClock::new(TimerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_default_duration() {
        let mut clock = clock();
        let player = PlayerId::default();
        let start = Instant::now();
        clock.start_turn(player, start);
        assert_eq!(clock.expired(start), None);
        assert_eq!(clock.expired(start + Duration::from_secs(15)), Some(player));
    }

    #[tokio::test(start_paused = true)]
    async fn warns_once_inside_threshold() {
        let mut clock = clock();
        let player = PlayerId::default();
        let start = Instant::now();
        clock.start_turn(player, start);
        assert!(clock.warning_due(start + Duration::from_secs(5)).is_none());
        let at = start + Duration::from_secs(11);
        let (who, remaining) = clock.warning_due(at).unwrap();
        assert_eq!(who, player);
        assert_eq!(remaining, Duration::from_secs(4));
        assert!(clock.warning_due(at).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn time_bank_extends_by_full_balance() {
        let mut clock = clock();
        let player = PlayerId::default();
        let start = Instant::now();
        clock.start_turn(player, start);
        assert!(clock.use_time_bank(player, 60_000, start));
        // 15s default + 60s bank
        assert_eq!(clock.expired(start + Duration::from_secs(74)), None);
        assert_eq!(clock.expired(start + Duration::from_secs(75)), Some(player));
        // once per turn
        assert!(!clock.use_time_bank(player, 60_000, start));
    }

    #[tokio::test(start_paused = true)]
    async fn time_bank_rejects_wrong_player_or_empty_bank() {
        let mut clock = clock();
        let player = PlayerId::default();
        let other = PlayerId::default();
        let start = Instant::now();
        clock.start_turn(player, start);
        assert!(!clock.use_time_bank(other, 60_000, start));
        assert!(!clock.use_time_bank(player, 0, start));
    }

    #[tokio::test(start_paused = true)]
    async fn bank_use_rearms_the_warning() {
        let mut clock = clock();
        let player = PlayerId::default();
        let start = Instant::now();
        clock.start_turn(player, start);
        let at = start + Duration::from_secs(12);
        assert!(clock.warning_due(at).is_some());
        assert!(clock.use_time_bank(player, 30_000, at));
        assert!(clock.warning_due(at).is_none()); // far from new deadline
        let near_end = start + Duration::from_secs(42);
        assert!(clock.warning_due(near_end).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn replenish_grants_per_interval_up_to_cap() {
        let mut banks = TimeBanks::new(TimerConfig::default());
        let player = PlayerId::default();
        let start = Instant::now();
        banks.register(player, start);
        assert!(banks.tick_replenish(start, |_| 0).is_empty());
        // one interval: +15s
        let updates = banks.tick_replenish(start + Duration::from_secs(30 * 60), |_| 60_000);
        assert_eq!(updates, vec![(player, 75_000)]);
        // three intervals at once, capped at 120s
        let updates =
            banks.tick_replenish(start + Duration::from_secs(4 * 30 * 60), |_| 110_000);
        assert_eq!(updates, vec![(player, 120_000)]);
        // at the cap: no update emitted
        let updates =
            banks.tick_replenish(start + Duration::from_secs(5 * 30 * 60), |_| 120_000);
        assert!(updates.is_empty());
    }
}
