//! The deterministic poker hand engine.
//!
//! [`Engine`] owns a table's authoritative state and drives hands through
//! their betting rounds: dealing, action legality, side pots, showdown with
//! Hi/Lo splits, run-it-twice boards, and rabbit-hunt previews. It is a pure
//! state machine with no clocks, no channels, and no I/O. The table coordinator in
//! `pit-room` feeds it actions and timer decisions and broadcasts what comes
//! out; `pit-records` persists its snapshots.
//!
//! ## Modules
//!
//! - [`variant`] — game variants and their per-variant policies
//! - [`stage`] — streets for community and stud games
//! - [`betting`] — action legality, blinds, bring-in, min-raise bookkeeping
//! - [`pots`] — layered side pots and deterministic remainder splits
//! - [`showdown`] — per-variant evaluation and pot distribution
//! - [`rit`] — run-it-twice eligibility, prompts, consent, execution
//! - [`rabbit`] — non-mutating previews of undealt streets
//! - [`snapshot`] — serialisable engine state and validated restore

mod action;
mod betting;
mod error;
mod flow;
mod player;
mod pots;
mod rabbit;
mod rit;
mod showdown;
mod snapshot;
mod stage;
mod table;
mod variant;

pub use action::*;
pub use error::*;
pub use flow::*;
pub use player::*;
pub use pots::*;
pub use rabbit::*;
pub use rit::*;
pub use showdown::*;
pub use snapshot::*;
pub use stage::*;
pub use table::*;
pub use variant::*;
