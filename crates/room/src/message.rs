use super::protocol::Ack;
use super::protocol::ClientCommand;
use pit_engine::EngineError;
use pit_engine::PlayerId;
use tokio::sync::oneshot;

/// The typed mailbox of a table task.
///
/// Everything that mutates a table arrives here and is processed one
/// message at a time. Timer deadlines wake the loop directly; the `Timer`
/// poke exists for drivers that want to force a tick (tests, ops tooling).
#[derive(Debug)]
pub enum TableMsg {
    /// A client command with its acknowledgement channel.
    Command {
        player: PlayerId,
        command: ClientCommand,
        reply: oneshot::Sender<Ack>,
    },
    /// Transport noticed this player drop; answers with a reconnect token.
    Disconnect {
        player: PlayerId,
        reply: oneshot::Sender<Result<String, EngineError>>,
    },
    /// A returning player presents their token; the reconciliation payload
    /// goes out on their broadcast room.
    Reconnect {
        player: PlayerId,
        token: String,
        reply: oneshot::Sender<Ack>,
    },
    /// Force a timer tick.
    Timer,
    /// Stop the loop: cancel timers, persist, refuse whatever is queued.
    Shutdown,
}
