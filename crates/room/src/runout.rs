use std::time::Duration;
use tokio::time::Instant;

/// Auto-runout pacing.
#[derive(Debug, Clone, Copy)]
pub struct RunoutConfig {
    /// Delay between revealed streets, and between the river and showdown.
    pub reveal_gap: Duration,
}

impl Default for RunoutConfig {
    fn default() -> Self {
        Self {
            reveal_gap: Duration::from_secs(5),
        }
    }
}

/// What the runout schedule wants done now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunoutFire {
    Reveal,
    Settle,
}

/// The reveal schedule for a locked hand.
///
/// Armed when the all-in lock engages. A pending run-it-twice prompt
/// holds the schedule until the decision lands. Each fire reveals one
/// street; after the last street one more gap passes before settlement.
/// Any state change that breaks the lock cancels the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runout {
    Idle,
    /// Prompt outstanding; nothing scheduled until it resolves.
    AwaitingRit,
    Revealing { next: Instant },
    Settling { at: Instant },
}

impl Runout {
    pub fn new() -> Self {
        Self::Idle
    }
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
    pub fn awaiting_rit(&mut self) {
        *self = Self::AwaitingRit;
    }
    pub fn schedule_reveal(&mut self, now: Instant, config: RunoutConfig) {
        *self = Self::Revealing {
            next: now + config.reveal_gap,
        };
    }
    pub fn schedule_settle(&mut self, now: Instant, config: RunoutConfig) {
        *self = Self::Settling {
            at: now + config.reveal_gap,
        };
    }
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }
    pub fn due(&self, now: Instant) -> Option<RunoutFire> {
        match self {
            Self::Revealing { next } if now >= *next => Some(RunoutFire::Reveal),
            Self::Settling { at } if now >= *at => Some(RunoutFire::Settle),
            _ => None,
        }
    }
    pub fn next_wake(&self) -> Option<Instant> {
        match self {
            Self::Revealing { next } => Some(*next),
            Self::Settling { at } => Some(*at),
            Self::Idle | Self::AwaitingRit => None,
        }
    }
}

impl Default for Runout {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reveal_fires_after_the_gap() {
        let config = RunoutConfig::default();
        let mut runout = Runout::new();
        let now = Instant::now();
        runout.schedule_reveal(now, config);
        assert_eq!(runout.due(now), None);
        assert_eq!(runout.due(now + Duration::from_secs(5)), Some(RunoutFire::Reveal));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_fires_after_the_final_gap() {
        let config = RunoutConfig::default();
        let mut runout = Runout::new();
        let now = Instant::now();
        runout.schedule_settle(now, config);
        assert_eq!(runout.due(now + Duration::from_secs(4)), None);
        assert_eq!(runout.due(now + Duration::from_secs(5)), Some(RunoutFire::Settle));
    }

    #[tokio::test(start_paused = true)]
    async fn awaiting_rit_schedules_nothing() {
        let mut runout = Runout::new();
        runout.awaiting_rit();
        assert_eq!(runout.next_wake(), None);
        assert_eq!(runout.due(Instant::now() + Duration::from_secs(60)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_clears_the_schedule() {
        let config = RunoutConfig::default();
        let mut runout = Runout::new();
        let now = Instant::now();
        runout.schedule_reveal(now, config);
        runout.cancel();
        assert!(runout.is_idle());
        assert_eq!(runout.due(now + Duration::from_secs(60)), None);
    }
}
