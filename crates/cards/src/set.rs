use super::card::Card;

/// An unordered set of cards stored as a 52-bit word.
///
/// One bit per unique card, so set algebra (union, complement, membership)
/// is single-instruction and a whole hand's cards pass between modules as
/// one `Copy` value. The [`Evaluator`] summarises a set into its rank
/// histogram and suit buckets in a single iteration pass.
///
/// [`Evaluator`]: super::evaluator::Evaluator
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CardSet(u64);

impl CardSet {
    pub const fn empty() -> Self {
        Self(0)
    }
    /// The full 52-card universe.
    pub const fn full() -> Self {
        Self(Self::MASK)
    }
    /// Number of cards in the set.
    pub fn size(&self) -> usize {
        self.0.count_ones() as usize
    }
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    pub fn contains(&self, card: &Card) -> bool {
        self.0 & u64::from(*card) != 0
    }
    pub fn insert(&mut self, card: Card) {
        self.0 |= u64::from(card);
    }
    pub fn remove(&mut self, card: Card) {
        self.0 &= !u64::from(card);
    }
    /// Union of two disjoint sets. Asserts disjointness: a card dealt twice
    /// is always a bug upstream.
    pub fn add(lhs: Self, rhs: Self) -> Self {
        debug_assert!(lhs.0 & rhs.0 == 0);
        Self(lhs.0 | rhs.0)
    }
    /// Union without the disjointness requirement.
    pub fn union(lhs: Self, rhs: Self) -> Self {
        Self(lhs.0 | rhs.0)
    }
    /// Cards of the universe not in this set.
    pub fn complement(&self) -> Self {
        Self(self.0 ^ Self::MASK)
    }
    /// The lowest card not in this set. Panics on a full set.
    pub fn lowest_absent(&self) -> Card {
        Card::from(self.complement().0.trailing_zeros() as u8)
    }
    /// Which ranks are present, neglecting suit, as a 13-bit mask.
    pub fn rank_mask(&self) -> u16 {
        self.iter()
            .map(|c| u16::from(c.rank()))
            .fold(0, |acc, r| acc | r)
    }
    /// Ascending iteration over members.
    pub fn iter(&self) -> impl Iterator<Item = Card> + '_ {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                None
            } else {
                let index = bits.trailing_zeros() as u8;
                bits &= bits - 1;
                Some(Card::from(index))
            }
        })
    }

    const MASK: u64 = 0x000FFFFFFFFFFFFF;
}

/// u64 isomorphism
impl From<u64> for CardSet {
    fn from(n: u64) -> Self {
        Self(n & Self::MASK)
    }
}
impl From<CardSet> for u64 {
    fn from(s: CardSet) -> Self {
        s.0
    }
}

impl From<Card> for CardSet {
    fn from(card: Card) -> Self {
        Self(u64::from(card))
    }
}
impl FromIterator<Card> for CardSet {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        iter.into_iter()
            .map(CardSet::from)
            .fold(Self::empty(), CardSet::union)
    }
}
impl From<&[Card]> for CardSet {
    fn from(cards: &[Card]) -> Self {
        cards.iter().copied().collect()
    }
}
impl From<CardSet> for Vec<Card> {
    fn from(s: CardSet) -> Self {
        s.iter().collect()
    }
}

impl TryFrom<&str> for CardSet {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Card::parse(s).map(|cards| cards.into_iter().collect())
    }
}

impl std::fmt::Display for CardSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let cards = self
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{}", cards)
    }
}
