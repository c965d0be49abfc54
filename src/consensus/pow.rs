// Proof of Work

use crate::constants::TARGET_BITS;
use crate::core::{sha256, Block, Hash256};

/// Proof-of-work search and validation for one block.
///
/// The difficulty target is `2^(256 - TARGET_BITS)`; a block hash is valid
/// when, read as a big-endian integer, it is strictly below the target.
pub struct ProofOfWork<'a> {
    block: &'a Block,
    /// Target as 32 big-endian bytes; a byte-wise comparison against a
    /// digest is the numeric comparison
    target: [u8; 32],
}

impl<'a> ProofOfWork<'a> {
    pub fn new(block: &'a Block) -> ProofOfWork<'a> {
        ProofOfWork {
            block,
            target: target_bytes(TARGET_BITS),
        }
    }

    /// Header preimage: prev_hash ‖ merkle_root ‖ timestamp ‖ TARGET_BITS,
    /// both integers as 8-byte big-endian two's complement
    fn setup_header(&self) -> Vec<u8> {
        let mut header = Vec::with_capacity(80);
        header.extend_from_slice(self.block.prev_hash.as_bytes());
        header.extend_from_slice(self.block.hash_transactions().as_bytes());
        header.extend_from_slice(&self.block.timestamp.to_be_bytes());
        header.extend_from_slice(&i64::from(TARGET_BITS).to_be_bytes());
        header
    }

    fn hash_with_nonce(header: &[u8], nonce: i64) -> Hash256 {
        let mut buf = Vec::with_capacity(header.len() + 8);
        buf.extend_from_slice(header);
        buf.extend_from_slice(&nonce.to_be_bytes());
        sha256(&buf)
    }

    fn meets_target(&self, digest: &Hash256) -> bool {
        digest.as_bytes()[..] < self.target[..]
    }

    /// Search nonces from zero until the header hash falls below the target.
    /// With 8 target bits a solution shows up within a few hundred attempts.
    pub fn run(&self) -> (i64, Hash256) {
        let header = self.setup_header();
        for nonce in 0..i64::MAX {
            let digest = Self::hash_with_nonce(&header, nonce);
            if self.meets_target(&digest) {
                log::debug!("proof-of-work solved: nonce={nonce} hash={digest}");
                return (nonce, digest);
            }
        }
        // an exhausted 63-bit nonce space means the environment is broken
        panic!("proof-of-work nonce space exhausted");
    }

    /// Recompute the header hash with the block's stored nonce; true iff it
    /// meets the target and equals the block's stored hash
    pub fn validate(&self) -> bool {
        let header = self.setup_header();
        let digest = Self::hash_with_nonce(&header, self.block.nonce);
        self.meets_target(&digest) && digest == self.block.hash
    }
}

fn target_bytes(bits: u32) -> [u8; 32] {
    // single set bit at 2^(256 - bits)
    let exp = 256 - bits;
    let mut target = [0u8; 32];
    target[31 - (exp / 8) as usize] = 1u8 << (exp % 8);
    target
}
