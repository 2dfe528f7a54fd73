use super::combos::Combos;
use super::evaluator::Evaluator;
use super::kicks::Kickers;
use super::ranking::Ranking;
use super::set::CardSet;

/// A fully-evaluated high-hand strength for comparison.
///
/// Combines a [`Ranking`] (hand category) with [`Kickers`] (tie-breaking
/// ranks). Ordering is lexicographic: ranking first, then kickers.
///
/// # Partial information
///
/// When fewer than five cards are known (streets not yet dealt), evaluation
/// pads internally with the lexicographically smallest cards not in the set,
/// keeping comparisons total and stable across callers. The filler cards are
/// an implementation detail and never appear in the result: callers receive
/// only the ranking and kickers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
pub struct Strength {
    value: Ranking,
    kicks: Kickers,
}

impl Strength {
    pub fn ranking(&self) -> Ranking {
        self.value
    }
    pub fn kickers(&self) -> Kickers {
        self.kicks
    }
    /// Best five-card hand under the Omaha rule: exactly two hole cards
    /// and exactly three board cards. Boards shorter than three cards are
    /// padded the same way as [`From<CardSet>`].
    pub fn omaha(hole: CardSet, board: CardSet) -> Self {
        let board = Self::pad(board, 3, CardSet::union(hole, board));
        Combos::of(2, hole)
            .flat_map(|pair| {
                Combos::of(3, board).map(move |trio| Self::exact(CardSet::add(pair, trio)))
            })
            .max()
            .expect("omaha evaluation requires hole cards")
    }
    /// Evaluates exactly the given cards, no padding.
    fn exact(cards: CardSet) -> Self {
        let evaluator = Evaluator::from(cards);
        let value = evaluator.category();
        let kicks = evaluator.kickers(value);
        Self { value, kicks }
    }
    /// Extends `cards` to `target` members with the smallest cards absent
    /// from `known`.
    fn pad(cards: CardSet, target: usize, known: CardSet) -> CardSet {
        let mut cards = cards;
        let mut known = known;
        while cards.size() < target {
            let filler = known.lowest_absent();
            cards.insert(filler);
            known.insert(filler);
        }
        cards
    }
}

impl From<CardSet> for Strength {
    fn from(cards: CardSet) -> Self {
        Self::exact(Self::pad(cards, 5, cards))
    }
}

impl From<(Ranking, Kickers)> for Strength {
    fn from((value, kicks): (Ranking, Kickers)) -> Self {
        Self { value, kicks }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
