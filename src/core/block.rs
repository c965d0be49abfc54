// Block data structure

use crate::consensus::ProofOfWork;
use crate::core::{Hash256, MerkleTree, Transaction};
use crate::error::{Error, Result};
use std::fmt;

/// Block of transactions chained by hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block creation time, Unix seconds
    pub timestamp: i64,
    /// Transactions carried by the block; the first one is the coinbase
    pub transactions: Vec<Transaction>,
    /// Hash of the previous block; `Hash256::ZERO` for genesis
    pub prev_hash: Hash256,
    /// Proof-of-work hash of this block; set by `mine`
    pub hash: Hash256,
    /// Nonce found by the proof-of-work search; set by `mine`
    pub nonce: i64,
}

impl Block {
    /// Create a non-mined block
    pub fn new(timestamp: i64, transactions: Vec<Transaction>, prev_hash: Hash256) -> Block {
        Block {
            timestamp,
            transactions,
            prev_hash,
            hash: Hash256::ZERO,
            nonce: 0,
        }
    }

    /// Create a non-mined genesis block holding a single coinbase
    pub fn genesis(timestamp: i64, coinbase: Transaction) -> Block {
        Block::new(timestamp, vec![coinbase], Hash256::ZERO)
    }

    /// Run the proof-of-work search and store the resulting nonce and hash
    pub fn mine(&mut self) {
        let (nonce, hash) = ProofOfWork::new(self).run();
        self.nonce = nonce;
        self.hash = hash;
    }

    /// Merkle root over the serialized transactions.
    /// This digest anchors the transactions in the proof-of-work header.
    pub fn hash_transactions(&self) -> Hash256 {
        let data: Vec<Vec<u8>> = self.transactions.iter().map(|tx| tx.serialize()).collect();
        MerkleTree::new(&data).root_hash()
    }

    /// Find a transaction in the block by its ID
    pub fn find_transaction(&self, id: &Hash256) -> Result<&Transaction> {
        self.transactions
            .iter()
            .find(|tx| tx.id == *id)
            .ok_or(Error::TxNotFound)
    }

    /// Multi-line listing including every transaction's inputs and outputs
    pub fn detail(&self) -> String {
        let mut lines = vec![format!("============ Block {} ============", self.hash)];
        lines.push(format!("Prev. hash: {}", self.prev_hash));
        lines.push(format!("Timestamp: {}", self.timestamp));
        lines.push(format!("Nonce: {}", self.nonce));
        lines.push("Transactions:".to_string());
        for tx in &self.transactions {
            lines.push(tx.to_string());
        }
        lines.join("\n")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "============ Block {} ============", self.hash)?;
        writeln!(f, "Prev. hash: {}", self.prev_hash)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "Transactions:")?;
        for (i, tx) in self.transactions.iter().enumerate() {
            writeln!(f, "{}: {}", i, tx.id)?;
        }
        Ok(())
    }
}
