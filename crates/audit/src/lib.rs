//! Verifiable shuffle seeds for run-it-twice boards.
//!
//! Every extra board dealt at all-in is keyed by a seed any player can audit
//! after the hand. The server publishes a public seed (a hash over server
//! entropy and the room/hand context), derives one seed per run, and commits
//! to the set through a hash chain. Given the announced seeds and inputs,
//! [`verify_seeds`] recomputes the chain and compares.
//!
//! Derivation, with `H = sha256` over UTF-8 and hex-encoded digests:
//!
//! ```text
//! public   = H(entropy ‖ context)            (or supplied directly)
//! seed_i   = H(public ‖ nonce ‖ i)           i in 1..=n
//! chain_0  = H(public)
//! chain_i  = H(chain_{i-1} ‖ seed_i)
//! ```

use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Hex-encoded sha256 of the input.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Mixes server entropy with caller-supplied context into a public seed.
pub fn public_seed(context: &str) -> String {
    let mut entropy = [0u8; 32];
    rand::rng().fill_bytes(&mut entropy);
    sha256_hex(&format!("{}{}", hex::encode(entropy), context))
}

/// Decodes a 64-hex seed into the 32-byte key a deck shuffle expects.
pub fn seed_bytes(seed: &str) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    let decoded = hex::decode(seed).unwrap_or_default();
    for (slot, byte) in bytes.iter_mut().zip(decoded) {
        *slot = byte;
    }
    bytes
}

/// A derived set of per-run seeds and their commitment chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedChain {
    pub public_seed: String,
    pub hand_nonce: String,
    pub seeds: Vec<String>,
    pub chain: Vec<String>,
}

impl SeedChain {
    /// Derives `n` seeds and the n-entry chain from the public seed and
    /// hand nonce.
    pub fn derive(public_seed: &str, hand_nonce: &str, n: usize) -> Self {
        let seeds: Vec<String> = (1..=n)
            .map(|i| sha256_hex(&format!("{}{}{}", public_seed, hand_nonce, i)))
            .collect();
        let chain = Self::chain_of(public_seed, &seeds);
        Self {
            public_seed: public_seed.to_string(),
            hand_nonce: hand_nonce.to_string(),
            seeds,
            chain,
        }
    }
    /// The 32-byte shuffle key for run `i` (zero-based).
    pub fn key(&self, i: usize) -> [u8; 32] {
        seed_bytes(&self.seeds[i])
    }
    pub fn runs(&self) -> usize {
        self.seeds.len()
    }
    fn chain_of(public_seed: &str, seeds: &[String]) -> Vec<String> {
        let mut link = sha256_hex(public_seed);
        seeds
            .iter()
            .map(|seed| {
                link = sha256_hex(&format!("{}{}", link, seed));
                link.clone()
            })
            .collect()
    }
}

/// Recomputes the chain for the announced seeds and compares it with the
/// announced chain.
pub fn verify_seeds(announced: &SeedChain) -> bool {
    let derived = SeedChain::derive(
        &announced.public_seed,
        &announced.hand_nonce,
        announced.runs(),
    );
    derived.seeds == announced.seeds && derived.chain == announced.chain
}
