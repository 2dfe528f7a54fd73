use super::player::Player;
use super::player::PlayerId;
use pit_core::Chips;
use serde::Deserialize;
use serde::Serialize;

/// One layer of the pot and the players who can win it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePot {
    pub amount: Chips,
    pub eligible: Vec<PlayerId>,
}

/// A player's line in the pot computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contribution {
    pub player: PlayerId,
    pub amount: Chips,
    pub folded: bool,
}

impl From<&Player> for Contribution {
    fn from(p: &Player) -> Self {
        Self {
            player: p.id(),
            amount: p.spent(),
            folded: p.is_folded(),
        }
    }
}

/// Builds layered side pots from per-player contributions.
///
/// Walks the unique positive contribution levels in ascending order. Each
/// layer is funded by everyone who contributed at least that level,
/// including folded players, whose chips stay in but who can win nothing;
/// eligibility is the unfolded contributors at the level.
///
/// An optional `base` pot (chips carried in from outside the contribution
/// lines, e.g. a forfeited ante) goes to a zeroth layer whose eligibility is
/// the intersection of all layers' eligibility.
///
/// Invariant: `Σ pot amounts == Σ contributions + base`.
pub fn side_pots(contributions: &[Contribution], base: Chips) -> Vec<SidePot> {
    let mut levels: Vec<Chips> = contributions
        .iter()
        .map(|c| c.amount)
        .filter(|a| *a > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots = Vec::new();
    if base > 0 {
        let everyone = match levels.last() {
            Some(top) => eligible_at(contributions, *top),
            None => eligible_at(contributions, 0),
        };
        pots.push(SidePot {
            amount: base,
            eligible: everyone,
        });
    }
    let mut previous = 0;
    for level in levels {
        let funders = contributions.iter().filter(|c| c.amount >= level).count() as Chips;
        pots.push(SidePot {
            amount: (level - previous) * funders,
            eligible: eligible_at(contributions, level),
        });
        previous = level;
    }
    debug_assert_eq!(
        pots.iter().map(|p| p.amount).sum::<Chips>(),
        contributions.iter().map(|c| c.amount).sum::<Chips>() + base,
    );
    pots
}

fn eligible_at(contributions: &[Contribution], level: Chips) -> Vec<PlayerId> {
    contributions
        .iter()
        .filter(|c| !c.folded && c.amount >= level)
        .map(|c| c.player)
        .collect()
}

/// Splits `amount` equally among `winners`, already ordered by the
/// remainder policy (ascending seats from the first eligible seat clockwise
/// of the dealer). Leftover chips go one at a time from the front.
pub fn split(amount: Chips, winners: &[PlayerId]) -> Vec<(PlayerId, Chips)> {
    if winners.is_empty() {
        return Vec::new();
    }
    let n = winners.len() as Chips;
    let share = amount / n;
    let bonus = amount % n;
    winners
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, share + if (i as Chips) < bonus { 1 } else { 0 }))
        .collect()
}
