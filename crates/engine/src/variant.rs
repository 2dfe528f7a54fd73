use super::stage::Stage;
use serde::Deserialize;
use serde::Serialize;

/// The poker variants this engine deals.
///
/// Variant behaviour is a small closed set, so it lives in a tagged enum
/// consulted through [`Variant::policy`] rather than trait objects: dealing
/// shape, street order, showdown evaluation, and Hi/Lo splitting all read
/// off the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Holdem,
    Omaha,
    OmahaHiLo,
    #[serde(rename = "7-stud")]
    SevenStud,
    #[serde(rename = "7-stud-hi-lo")]
    SevenStudHiLo,
    #[serde(rename = "5-stud")]
    FiveStud,
}

/// No-limit or pot-limit betting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BettingMode {
    NoLimit,
    PotLimit,
}

/// How a variant deals and scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Down cards dealt before the first street.
    pub down: usize,
    /// Up cards dealt before the first street (stud only).
    pub up: usize,
    /// Whether the variant uses a community board.
    pub community: bool,
    /// Whether the pot splits against an eight-or-better low.
    pub hi_lo: bool,
    /// Whether showdown must use exactly two hole and three board cards.
    pub omaha: bool,
    /// The betting streets in order.
    pub streets: &'static [Stage],
}

impl Variant {
    pub const fn policy(&self) -> Policy {
        match self {
            Self::Holdem => Policy {
                down: 2,
                up: 0,
                community: true,
                hi_lo: false,
                omaha: false,
                streets: &[Stage::Preflop, Stage::Flop, Stage::Turn, Stage::River],
            },
            Self::Omaha => Policy {
                down: 4,
                up: 0,
                community: true,
                hi_lo: false,
                omaha: true,
                streets: &[Stage::Preflop, Stage::Flop, Stage::Turn, Stage::River],
            },
            Self::OmahaHiLo => Policy {
                down: 4,
                up: 0,
                community: true,
                hi_lo: true,
                omaha: true,
                streets: &[Stage::Preflop, Stage::Flop, Stage::Turn, Stage::River],
            },
            Self::SevenStud => Policy {
                down: 2,
                up: 1,
                community: false,
                hi_lo: false,
                omaha: false,
                streets: &[
                    Stage::Third,
                    Stage::Fourth,
                    Stage::Fifth,
                    Stage::Sixth,
                    Stage::Seventh,
                ],
            },
            Self::SevenStudHiLo => Policy {
                down: 2,
                up: 1,
                community: false,
                hi_lo: true,
                omaha: false,
                streets: &[
                    Stage::Third,
                    Stage::Fourth,
                    Stage::Fifth,
                    Stage::Sixth,
                    Stage::Seventh,
                ],
            },
            Self::FiveStud => Policy {
                down: 1,
                up: 1,
                community: false,
                hi_lo: false,
                omaha: false,
                streets: &[Stage::Second, Stage::Third, Stage::Fourth, Stage::Fifth],
            },
        }
    }
    pub fn is_stud(&self) -> bool {
        !self.policy().community
    }
    pub fn is_hi_lo(&self) -> bool {
        self.policy().hi_lo
    }
    /// The first betting street.
    pub fn first_street(&self) -> Stage {
        self.policy().streets[0]
    }
    /// The street after `stage`, or `Showdown` past the last one.
    pub fn next_street(&self, stage: Stage) -> Stage {
        let streets = self.policy().streets;
        streets
            .iter()
            .position(|s| *s == stage)
            .and_then(|i| streets.get(i + 1))
            .copied()
            .unwrap_or(Stage::Showdown)
    }
    /// Cards dealt to each live player entering `stage`: (down, up).
    /// Community variants deal the board instead; see [`Stage::board_target`].
    pub fn stud_deal(&self, stage: Stage) -> (usize, usize) {
        match (self, stage) {
            // seventh street comes down
            (Self::SevenStud | Self::SevenStudHiLo, Stage::Seventh) => (1, 0),
            (Self::SevenStud | Self::SevenStudHiLo, Stage::Fourth)
            | (Self::SevenStud | Self::SevenStudHiLo, Stage::Fifth)
            | (Self::SevenStud | Self::SevenStudHiLo, Stage::Sixth) => (0, 1),
            (Self::FiveStud, Stage::Third)
            | (Self::FiveStud, Stage::Fourth)
            | (Self::FiveStud, Stage::Fifth) => (0, 1),
            _ => (0, 0),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Holdem => write!(f, "holdem"),
            Self::Omaha => write!(f, "omaha"),
            Self::OmahaHiLo => write!(f, "omaha-hi-lo"),
            Self::SevenStud => write!(f, "7-stud"),
            Self::SevenStudHiLo => write!(f, "7-stud-hi-lo"),
            Self::FiveStud => write!(f, "5-stud"),
        }
    }
}

impl TryFrom<&str> for Variant {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "holdem" => Ok(Self::Holdem),
            "omaha" => Ok(Self::Omaha),
            "omaha-hi-lo" => Ok(Self::OmahaHiLo),
            "7-stud" => Ok(Self::SevenStud),
            "7-stud-hi-lo" => Ok(Self::SevenStudHiLo),
            "5-stud" => Ok(Self::FiveStud),
            _ => Err(format!("invalid variant: {}", s)),
        }
    }
}
