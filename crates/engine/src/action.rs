use pit_core::Chips;
use serde::Deserialize;
use serde::Serialize;

/// A voluntary player decision.
///
/// Forced bets (blinds, the stud bring-in) are posted by the engine when a
/// hand starts and never travel as actions. `Bet` and `Raise` carry the
/// player's **total** commitment for the round after the action (the
/// raise-to amount, not the increment), which is also the wire convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    Bet { amount: Chips },
    Raise { amount: Chips },
}

impl PlayerAction {
    /// True if chips move into the pot.
    pub fn is_wager(&self) -> bool {
        !matches!(self, Self::Fold | Self::Check)
    }
    /// True for a bet or raise.
    pub fn is_aggro(&self) -> bool {
        matches!(self, Self::Bet { .. } | Self::Raise { .. })
    }
    pub fn amount(&self) -> Option<Chips> {
        match self {
            Self::Bet { amount } | Self::Raise { amount } => Some(*amount),
            _ => None,
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet { .. } => "bet",
            Self::Raise { .. } => "raise",
        }
    }
}

impl TryFrom<&str> for PlayerAction {
    type Error = &'static str;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.first().map(|p| p.to_lowercase()).as_deref() {
            Some("fold") => Ok(Self::Fold),
            Some("check") => Ok(Self::Check),
            Some("call") => Ok(Self::Call),
            Some("bet") => parts
                .get(1)
                .and_then(|n| n.parse().ok())
                .map(|amount| Self::Bet { amount })
                .ok_or("invalid bet amount"),
            Some("raise") => parts
                .get(1)
                .and_then(|n| n.parse().ok())
                .map(|amount| Self::Raise { amount })
                .ok_or("invalid raise amount"),
            _ => Err("invalid action type"),
        }
    }
}

impl std::fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Fold => write!(f, "FOLD"),
            Self::Check => write!(f, "CHECK"),
            Self::Call => write!(f, "CALL"),
            Self::Bet { amount } => write!(f, "BET   {}", amount),
            Self::Raise { amount } => write!(f, "RAISE {}", amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid() {
        assert_eq!(PlayerAction::try_from("fold"), Ok(PlayerAction::Fold));
        assert_eq!(PlayerAction::try_from("check"), Ok(PlayerAction::Check));
        assert_eq!(
            PlayerAction::try_from("raise 40"),
            Ok(PlayerAction::Raise { amount: 40 })
        );
    }

    #[test]
    fn parse_invalid() {
        assert!(PlayerAction::try_from("bet").is_err());
        assert!(PlayerAction::try_from("levitate").is_err());
    }

    #[test]
    fn wire_shape() {
        let json = serde_json::to_string(&PlayerAction::Bet { amount: 25 }).unwrap();
        assert_eq!(json, r#"{"type":"bet","amount":25}"#);
        assert_eq!(
            serde_json::from_str::<PlayerAction>(r#"{"type":"fold"}"#).unwrap(),
            PlayerAction::Fold
        );
    }
}
