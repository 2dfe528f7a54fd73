use super::card::Card;
use super::set::CardSet;

/// Lexicographic iterator over all k-card subsets of a card set.
///
/// Materialises the source cards once, then walks an index odometer: each
/// step advances the rightmost pick that still has headroom and re-packs
/// every pick after it. O(k) state, deterministic ascending order. Used by
/// the Omaha evaluator to enumerate the C(4,2) × C(5,3) legal hole/board
/// pairings.
pub struct Combos {
    cards: Vec<Card>,
    picks: Vec<usize>,
    done: bool,
}

impl Combos {
    /// All `k`-card subsets drawn from `within`.
    pub fn of(k: usize, within: CardSet) -> Self {
        let cards: Vec<Card> = within.iter().collect();
        Self {
            done: k == 0 || k > cards.len(),
            picks: (0..k).collect(),
            cards,
        }
    }
    fn current(&self) -> CardSet {
        self.picks.iter().map(|&i| self.cards[i]).collect()
    }
    /// Advances to the next combination, or marks the iterator exhausted.
    ///
    /// A pick at slot `i` may climb as far as `n - (k - i)`: it must leave
    /// room for every pick to its right. The rightmost pick below its
    /// ceiling advances, and the picks after it re-pack tightly behind it.
    fn step(&mut self) {
        let k = self.picks.len();
        let n = self.cards.len();
        let movable = (0..k).rev().find(|&i| self.picks[i] < n - (k - i));
        match movable {
            None => self.done = true,
            Some(slot) => {
                self.picks[slot] += 1;
                for i in slot + 1..k {
                    self.picks[i] = self.picks[i - 1] + 1;
                }
            }
        }
    }
}

impl Iterator for Combos {
    type Item = CardSet;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let subset = self.current();
        self.step();
        Some(subset)
    }
}
