//! Card primitives, seeded dealing, and hand evaluation.
//!
//! The representation is compact throughout: a [`Card`] is a byte, a
//! [`CardSet`] is a 52-bit word, and the [`Evaluator`] reads the best
//! five-card ranking off a rank histogram and per-suit buckets built in
//! one pass. The [`Deck`] is an ordered, cursor-based shuffle keyed by a
//! 32-byte seed so that runouts, previews, and audit replays all agree on
//! what comes next.

mod card;
mod combos;
mod deck;
mod evaluator;
mod kicks;
mod low;
mod rank;
mod ranking;
mod set;
mod strength;
mod suit;

pub use card::*;
pub use combos::*;
pub use deck::*;
pub use evaluator::*;
pub use kicks::*;
pub use low::*;
pub use rank::*;
pub use ranking::*;
pub use set::*;
pub use strength::*;
pub use suit::*;
