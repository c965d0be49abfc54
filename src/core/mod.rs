// Core blockchain data structures

mod block;
mod hash;
mod merkle;
mod serialize;
mod transaction;
mod types;

pub use block::Block;
pub use hash::{double_sha256, hash160, sha256};
pub use merkle::{verify_proof, MerkleProof, MerkleTree, Side};
pub use serialize::*;
pub use transaction::{Transaction, TxInput, TxOutput};
pub use types::Hash256;
