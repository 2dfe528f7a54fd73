//! Persistence records and the sink the engine writes through.
//!
//! The core never talks to a database: it serialises snapshots and outcome
//! records and hands them to a [`PersistenceSink`] owned by the host
//! process. Writes are best-effort: a sink failure must never stall a
//! table, so the coordinator fires and forgets and relies on snapshots for
//! recovery.

mod outcome;
mod sink;

pub use outcome::*;
pub use sink::*;
