//! Live table coordination for pitboss.
//!
//! One asynchronous task per table, serial within it. Every mutation of the
//! engine flows through the table's typed mailbox: client commands, timer
//! fires, reconnects, shutdown. Timers never touch state directly; they
//! wake the loop, and the loop decides.
//!
//! ## Architecture
//!
//! - [`Coordinator`] — opens tables, routes commands, owns shutdown
//! - [`TableActor`] — the single-writer loop around one [`Engine`]
//! - [`Broadcaster`] — versioned, sanitised state delivery with rate limits
//! - [`TurnClock`] / [`TimeBanks`] — decision deadlines and time banks
//! - [`Runout`] — the all-in reveal schedule
//! - [`ReconnectStore`] — signed tokens, grace windows, missed-action log
//!
//! [`Engine`]: pit_engine::Engine

mod actor;
mod broadcast;
mod message;
mod protocol;
mod reconnect;
mod room;
mod runout;
mod sanitize;
mod sinks;
mod timer;

pub use actor::*;
pub use broadcast::*;
pub use message::*;
pub use protocol::*;
pub use reconnect::*;
pub use room::*;
pub use runout::*;
pub use sanitize::*;
pub use sinks::*;
pub use timer::*;
