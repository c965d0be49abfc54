// Educational UTXO blockchain replicated across in-process peers

pub mod chain;
pub mod cli;
pub mod consensus;
pub mod constants;
pub mod core;
pub mod error;
pub mod network;
pub mod wallet;

// Re-exports for convenience
pub use chain::{Blockchain, UtxoSet};
pub use cli::Console;
pub use consensus::ProofOfWork;
pub use constants::{BLOCK_REWARD, TARGET_BITS};
pub use crate::core::{Block, Hash256, MerkleProof, MerkleTree, Transaction, TxInput, TxOutput};
pub use error::{Error, Result};
pub use network::{Node, Peer};
pub use wallet::KeyPair;
