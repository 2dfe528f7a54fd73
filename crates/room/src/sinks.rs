use rand::RngCore;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Fan-out to connected clients.
///
/// The transport (WebSocket server, message bus, test harness) implements
/// this one method. Delivery must not back-pressure the table loop:
/// implementations queue internally and shed `state_update` load rather
/// than block; `reconcile` heals whatever gets dropped.
#[async_trait::async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn deliver(&self, room: &str, event: &str, payload: serde_json::Value);
}

/// Seeds for shuffles and audit contexts.
///
/// The engine itself never touches the OS: whoever hosts the coordinator
/// decides where randomness comes from, which is also what makes timing
/// tests deterministic.
pub trait Entropy: Send + Sync {
    /// A fresh 32-byte shuffle seed.
    fn shuffle_seed(&self) -> [u8; 32];
    /// The public audit seed for a hand, mixing entropy with context.
    fn public_seed(&self, context: &str) -> String {
        pit_audit::public_seed(context)
    }
}

/// Operating-system entropy.
#[derive(Debug, Default)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    fn shuffle_seed(&self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        seed
    }
}

/// Fixed entropy for tests: same seed, derived public seeds.
#[derive(Debug)]
pub struct FixedEntropy(pub [u8; 32]);

impl Entropy for FixedEntropy {
    fn shuffle_seed(&self) -> [u8; 32] {
        self.0
    }
    fn public_seed(&self, context: &str) -> String {
        pit_audit::sha256_hex(context)
    }
}

/// A recording sink for tests: every delivery, in order.
#[derive(Debug, Default)]
pub struct MemoryBroadcast {
    messages: Mutex<VecDeque<(String, String, serde_json::Value)>>,
}

impl MemoryBroadcast {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn drain(&self) -> Vec<(String, String, serde_json::Value)> {
        self.messages.lock().expect("sink lock").drain(..).collect()
    }
    pub fn count(&self) -> usize {
        self.messages.lock().expect("sink lock").len()
    }
    /// Deliveries to one room, in order.
    pub fn for_room(&self, room: &str) -> Vec<(String, serde_json::Value)> {
        self.messages
            .lock()
            .expect("sink lock")
            .iter()
            .filter(|(r, _, _)| r == room)
            .map(|(_, e, p)| (e.clone(), p.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl BroadcastSink for MemoryBroadcast {
    async fn deliver(&self, room: &str, event: &str, payload: serde_json::Value) {
        self.messages
            .lock()
            .expect("sink lock")
            .push_back((room.to_string(), event.to_string(), payload));
    }
}
