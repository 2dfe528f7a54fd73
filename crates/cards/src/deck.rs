use super::card::Card;
use super::set::CardSet;
use pit_core::DECK_SIZE;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// An ordered deck with a draw cursor.
///
/// The order is fixed at shuffle time by a Fisher–Yates pass keyed on a
/// 32-byte seed, so a deck is fully determined by its seed: replays, audits,
/// and run-it-twice re-deals all reconstruct the same sequence. Draws consume
/// from the front; the undrawn suffix stays visible through
/// [`remaining`](Self::remaining) for previews and snapshots.
///
/// Serde carries only the undrawn suffix, so a restored deck continues
/// exactly where the snapshot left off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
}

impl Deck {
    /// A full deck shuffled by the given seed.
    pub fn shuffled(seed: [u8; 32]) -> Self {
        let mut cards: Vec<Card> = (0..DECK_SIZE as u8).map(Card::from).collect();
        let mut rng = StdRng::from_seed(seed);
        cards.shuffle(&mut rng);
        Self { cards, cursor: 0 }
    }
    /// Draws the top card, advancing the cursor.
    pub fn draw(&mut self) -> Option<Card> {
        let card = self.cards.get(self.cursor).copied();
        if card.is_some() {
            self.cursor += 1;
        }
        card
    }
    /// Draws the top `k` cards. Panics if fewer remain; the engine never
    /// over-draws a 52-card deck with at most 9 players.
    pub fn draw_n(&mut self, k: usize) -> Vec<Card> {
        debug_assert!(self.len() >= k);
        (0..k).filter_map(|_| self.draw()).collect()
    }
    /// The undrawn suffix, top of the deck first.
    pub fn remaining(&self) -> &[Card] {
        &self.cards[self.cursor..]
    }
    /// Number of undrawn cards.
    pub fn len(&self) -> usize {
        self.cards.len() - self.cursor
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn contains(&self, card: &Card) -> bool {
        self.remaining().contains(card)
    }
    /// A new deck holding only this deck's undrawn suffix, cursor rewound.
    /// The baseline for run-it-twice forks and rabbit previews.
    pub fn fork(&self) -> Self {
        Self {
            cards: self.remaining().to_vec(),
            cursor: 0,
        }
    }
    /// A fork with the given cards removed, preserving order.
    pub fn without(&self, used: &CardSet) -> Self {
        Self {
            cards: self
                .remaining()
                .iter()
                .copied()
                .filter(|c| !used.contains(c))
                .collect(),
            cursor: 0,
        }
    }
    /// A fork whose order is re-randomised by a fresh seed. Each run-it-twice
    /// board re-shuffles the baseline with its own audited seed.
    pub fn reshuffled(&self, seed: [u8; 32]) -> Self {
        let mut cards = self.remaining().to_vec();
        let mut rng = StdRng::from_seed(seed);
        cards.shuffle(&mut rng);
        Self { cards, cursor: 0 }
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards, cursor: 0 }
    }
}

impl serde::Serialize for Deck {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.remaining())
    }
}
impl<'de> serde::Deserialize<'de> for Deck {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<Card>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(n: u8) -> [u8; 32] {
        [n; 32]
    }

    #[test]
    fn shuffle_is_deterministic() {
        assert_eq!(Deck::shuffled(seed(7)), Deck::shuffled(seed(7)));
        assert_ne!(Deck::shuffled(seed(7)), Deck::shuffled(seed(8)));
    }

    #[test]
    fn draws_continue_from_cursor() {
        let mut deck = Deck::shuffled(seed(1));
        let first = deck.draw_n(3);
        let fourth = deck.draw().unwrap();
        let fresh = Deck::shuffled(seed(1)).draw_n(4);
        assert_eq!(fresh[..3], first[..]);
        assert_eq!(fresh[3], fourth);
    }

    #[test]
    fn remaining_is_the_undrawn_suffix() {
        let mut deck = Deck::shuffled(seed(2));
        deck.draw_n(5);
        assert_eq!(deck.len(), 47);
        let drawn: Vec<Card> = Deck::shuffled(seed(2)).draw_n(5);
        for card in drawn {
            assert!(!deck.contains(&card));
        }
    }

    #[test]
    fn fork_rewinds_without_sharing() {
        let mut deck = Deck::shuffled(seed(3));
        deck.draw_n(10);
        let mut fork = deck.fork();
        assert_eq!(fork.len(), deck.len());
        let preview = fork.draw_n(3);
        assert_eq!(preview[..], deck.remaining()[..3]);
        assert_eq!(deck.len(), 42);
    }

    #[test]
    fn without_filters_used_cards() {
        let deck = Deck::shuffled(seed(4));
        let used: CardSet = deck.remaining()[..2].into();
        let filtered = deck.without(&used);
        assert_eq!(filtered.len(), 50);
        assert!(filtered.remaining().iter().all(|c| !used.contains(c)));
    }

    #[test]
    fn serde_round_trip_preserves_cursor_position() {
        let mut deck = Deck::shuffled(seed(5));
        deck.draw_n(7);
        let json = serde_json::to_string(&deck).unwrap();
        let restored: Deck = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.remaining(), deck.remaining());
    }
}
