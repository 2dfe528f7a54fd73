use super::sanitize::TableView;
use pit_core::Chips;
use pit_core::Millis;
use pit_core::Position;
use pit_core::Seq;
use pit_cards::Card;
use pit_engine::EngineError;
use pit_engine::PlayerAction;
use pit_engine::PlayerId;
use pit_engine::RitPrompt;
use pit_engine::RitState;
use pit_engine::Stage;
use pit_engine::TableId;
use serde::Deserialize;
use serde::Serialize;

/// Commands clients send at a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    JoinTable { name: String, seat: Position, stack: Chips },
    LeaveTable,
    StartHand,
    PlayerAction { action: PlayerAction },
    EnableRunItTwice { runs: usize },
    DeclineRunItTwice,
    ConsentRunItTwice,
    UseTimebank,
    RabbitHuntPreview { street: Stage },
}

/// Messages sent from server to clients.
///
/// `state_update` is the per-sequence delta channel; `reconcile` is the
/// full-state healing channel and is never rate limited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateUpdate {
        table: TableId,
        sequence: Seq,
        state: TableView,
    },
    Reconcile {
        table: TableId,
        sequence: Seq,
        state: TableView,
        grace_remaining_ms: Millis,
        missed: Vec<LoggedAction>,
    },
    /// Echo of an applied action; `auto` marks timer- or
    /// disconnect-driven ones.
    PlayerAction {
        table: TableId,
        player: PlayerId,
        action: PlayerAction,
        auto: bool,
    },
    TimerUpdate {
        table: TableId,
        player: PlayerId,
        remaining_ms: Millis,
        warning: bool,
    },
    TimebankUpdate {
        table: TableId,
        player: PlayerId,
        amount_ms: Millis,
    },
    RitPrompt {
        table: TableId,
        #[serde(flatten)]
        prompt: RitPrompt,
    },
    RitEnabled {
        table: TableId,
        runs: usize,
        rit: RitState,
    },
    RabbitPreview {
        table: TableId,
        street: Stage,
        cards: Vec<Card>,
    },
    HandEnd {
        table: TableId,
        payouts: Vec<pit_engine::Payout>,
    },
}

impl ServerMessage {
    /// The wire event name, identical to the serde tag.
    pub fn event(&self) -> &'static str {
        match self {
            Self::StateUpdate { .. } => "state_update",
            Self::Reconcile { .. } => "reconcile",
            Self::PlayerAction { .. } => "player_action",
            Self::TimerUpdate { .. } => "timer_update",
            Self::TimebankUpdate { .. } => "timebank_update",
            Self::RitPrompt { .. } => "rit_prompt",
            Self::RitEnabled { .. } => "rit_enabled",
            Self::RabbitPreview { .. } => "rabbit_preview",
            Self::HandEnd { .. } => "hand_end",
        }
    }
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("serialize server message")
    }
}

/// One entry of the per-table action log, replayed to reconnecting
/// clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedAction {
    pub sequence: Seq,
    pub player: PlayerId,
    pub action: PlayerAction,
    pub auto: bool,
}

/// Acknowledgement envelope for every inbound command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            code: None,
        }
    }
    pub fn is_ok(&self) -> bool {
        self.success
    }
}

impl From<EngineError> for Ack {
    fn from(e: EngineError) -> Self {
        Self {
            success: false,
            error: Some(e.to_string()),
            code: Some(e.code().to_string()),
        }
    }
}

impl From<Result<(), EngineError>> for Ack {
    fn from(r: Result<(), EngineError>) -> Self {
        match r {
            Ok(()) => Self::ok(),
            Err(e) => Self::from(e),
        }
    }
}
