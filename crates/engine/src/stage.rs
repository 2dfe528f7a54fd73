use serde::Deserialize;
use serde::Serialize;

/// A point in a hand's life: the betting streets of community and stud
/// games, plus the two terminal phases.
///
/// Which streets occur, and in what order, is the variant's business; see
/// [`Variant::policy`]. Community games walk `Preflop → River`; stud games
/// walk `Second/Third → Fifth/Seventh` (named for the number of cards each
/// player holds on that street).
///
/// [`Variant::policy`]: super::variant::Variant::policy
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preflop,
    Flop,
    Turn,
    River,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Showdown,
    Complete,
}

impl Stage {
    /// Cumulative community cards visible on this street.
    pub fn board_target(&self) -> usize {
        match self {
            Self::Preflop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River => 5,
            _ => 0,
        }
    }
    /// True while betting can still happen.
    pub fn is_betting(&self) -> bool {
        !matches!(self, Self::Showdown | Self::Complete)
    }
    /// True for the stud streets.
    pub fn is_stud(&self) -> bool {
        matches!(
            self,
            Self::Second | Self::Third | Self::Fourth | Self::Fifth | Self::Sixth | Self::Seventh
        )
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Preflop => write!(f, "preflop"),
            Self::Flop => write!(f, "flop"),
            Self::Turn => write!(f, "turn"),
            Self::River => write!(f, "river"),
            Self::Second => write!(f, "second"),
            Self::Third => write!(f, "third"),
            Self::Fourth => write!(f, "fourth"),
            Self::Fifth => write!(f, "fifth"),
            Self::Sixth => write!(f, "sixth"),
            Self::Seventh => write!(f, "seventh"),
            Self::Showdown => write!(f, "showdown"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

impl TryFrom<&str> for Stage {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "preflop" => Ok(Self::Preflop),
            "flop" => Ok(Self::Flop),
            "turn" => Ok(Self::Turn),
            "river" => Ok(Self::River),
            "second" => Ok(Self::Second),
            "third" => Ok(Self::Third),
            "fourth" => Ok(Self::Fourth),
            "fifth" => Ok(Self::Fifth),
            "sixth" => Ok(Self::Sixth),
            "seventh" => Ok(Self::Seventh),
            "showdown" => Ok(Self::Showdown),
            _ => Err(format!("invalid stage: {}", s)),
        }
    }
}
