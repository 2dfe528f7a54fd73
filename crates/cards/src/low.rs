use super::combos::Combos;
use super::set::CardSet;

/// An eight-or-better low hand: five distinct ranks at eight or below,
/// aces low, ace-to-five ordering.
///
/// `Low::none()` is the sentinel for "no qualifying low"; it compares below
/// every qualifying hand. Among qualifying hands a *greater* `Low` is the
/// better (lower) one, so `max()` picks the winner just as it does for
/// [`Strength`].
///
/// [`Strength`]: super::strength::Strength
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Low(Option<[u8; 5]>);

impl Low {
    /// The no-low sentinel.
    pub const fn none() -> Self {
        Self(None)
    }
    pub fn qualifies(&self) -> bool {
        self.0.is_some()
    }
    /// Best qualifying low from any five of the given cards.
    pub fn eval(cards: CardSet) -> Self {
        let mut values: Vec<u8> = (1..=8u8)
            .filter(|v| cards.iter().any(|c| c.rank().low_value() == *v))
            .collect();
        if values.len() < 5 {
            return Self::none();
        }
        values.truncate(5);
        values.reverse();
        Self(Some([values[0], values[1], values[2], values[3], values[4]]))
    }
    /// Best qualifying low using exactly two hole cards and exactly three
    /// board cards.
    pub fn omaha(hole: CardSet, board: CardSet) -> Self {
        if board.size() < 3 {
            return Self::none();
        }
        Combos::of(2, hole)
            .flat_map(|pair| Combos::of(3, board).map(move |trio| Self::exact(pair, trio)))
            .max()
            .unwrap_or(Self::none())
    }
    /// A low from exactly five chosen cards: all five must hold distinct
    /// ranks at eight or below.
    fn exact(pair: CardSet, trio: CardSet) -> Self {
        let cards = CardSet::add(pair, trio);
        let mut values: Vec<u8> = cards.iter().map(|c| c.rank().low_value()).collect();
        values.sort_unstable_by(|a, b| b.cmp(a));
        values.dedup();
        if values.len() == 5 && values[0] <= 8 {
            Self(Some([values[0], values[1], values[2], values[3], values[4]]))
        } else {
            Self::none()
        }
    }
    /// The five low values, highest first, when qualifying.
    pub fn values(&self) -> Option<[u8; 5]> {
        self.0
    }
}

/// Ace-to-five ordering: compare from the highest card down; the lower hand
/// is the stronger one, so it sorts greater. No-low is the minimum.
impl Ord for Low {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.0, other.0) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(&b).reverse(),
        }
    }
}
impl PartialOrd for Low {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Low {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            None => write!(f, "no low"),
            Some(values) => {
                let names = values
                    .iter()
                    .map(|v| match v {
                        1 => "A".to_string(),
                        n => n.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("-");
                write!(f, "{} low", names)
            }
        }
    }
}
