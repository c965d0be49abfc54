// Append-only chain replica

use crate::chain::UtxoSet;
use crate::consensus::ProofOfWork;
use crate::constants::GENESIS_COINBASE_DATA;
use crate::core::{Block, Hash256, Transaction};
use crate::error::{Error, Result};
use p256::ecdsa::SigningKey;
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Ordered, non-empty sequence of blocks. The first block is genesis; every
/// later block links to its predecessor by hash. Mutation is append-only.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    /// Create a chain whose genesis block pays the reward to `address`
    pub fn new(address: &str) -> Result<Blockchain> {
        let coinbase = Transaction::new_coinbase(address, GENESIS_COINBASE_DATA)?;
        let mut genesis = Block::genesis(unix_now(), coinbase);
        genesis.mine();
        Ok(Blockchain {
            blocks: vec![genesis],
        })
    }

    pub fn genesis_block(&self) -> &Block {
        &self.blocks[0]
    }

    /// The last block of the chain
    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain is never empty")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Find a block by its hash
    pub fn get_block(&self, hash: &Hash256) -> Result<&Block> {
        self.blocks
            .iter()
            .find(|block| block.hash == *hash)
            .ok_or(Error::BlockNotFound)
    }

    /// Structural check for a candidate block: it must carry at least one
    /// transaction and its proof-of-work must hold
    pub fn validate_block(&self, block: &Block) -> bool {
        !block.transactions.is_empty() && ProofOfWork::new(block).validate()
    }

    /// Append a block received from another peer. On top of `validate_block`
    /// the block must extend the current tip.
    pub fn append_block(&mut self, block: Block) -> Result<()> {
        if !self.validate_block(&block) {
            return Err(Error::InvalidBlock);
        }
        if block.prev_hash != self.tip().hash {
            return Err(Error::InvalidBlock);
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Mine a new block on top of the current tip.
    ///
    /// Transactions that fail `verify_transaction` are discarded; mining
    /// with nothing left fails with `NoValidTx`. The mined block is
    /// appended and a copy returned for broadcasting.
    pub fn mine_block(&mut self, transactions: Vec<Transaction>) -> Result<Block> {
        let valid: Vec<Transaction> = transactions
            .into_iter()
            .filter(|tx| self.verify_transaction(tx))
            .collect();
        if valid.is_empty() {
            return Err(Error::NoValidTx);
        }

        let mut block = Block::new(unix_now(), valid, self.tip().hash);
        block.mine();
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// Verify a transaction against the current chain state: every input
    /// must reference an unspent output, and every signature must check out
    /// against the prior transactions it spends. Coinbase is trivially valid.
    pub fn verify_transaction(&self, tx: &Transaction) -> bool {
        if tx.is_coinbase() {
            return true;
        }
        let utxos = self.find_utxo_set();
        for input in &tx.vin {
            let Ok(out_index) = u32::try_from(input.out_index) else {
                return false;
            };
            if utxos.get(&input.prev_tx_id, out_index).is_none() {
                return false;
            }
        }
        let Ok(prev_txs) = self.input_txs_of(tx) else {
            return false;
        };
        tx.verify(&prev_txs)
    }

    /// Find a transaction anywhere in the chain by its ID
    pub fn find_transaction(&self, id: &Hash256) -> Result<&Transaction> {
        for block in &self.blocks {
            if let Ok(tx) = block.find_transaction(id) {
                return Ok(tx);
            }
        }
        Err(Error::TxNotFound)
    }

    /// Rebuild the UTXO set by replaying every block from genesis
    pub fn find_utxo_set(&self) -> UtxoSet {
        let mut utxos = UtxoSet::new();
        for block in &self.blocks {
            utxos.update(&block.transactions);
        }
        utxos
    }

    /// Collect the prior transaction of every input of `tx`, keyed by ID.
    /// Fails with `TxNotFound` when none of them is on the chain.
    pub fn input_txs_of(&self, tx: &Transaction) -> Result<HashMap<Hash256, Transaction>> {
        let mut prev_txs = HashMap::new();
        for input in &tx.vin {
            if let Ok(prev_tx) = self.find_transaction(&input.prev_tx_id) {
                prev_txs.insert(input.prev_tx_id, prev_tx.clone());
            }
        }
        if prev_txs.is_empty() {
            return Err(Error::TxNotFound);
        }
        Ok(prev_txs)
    }

    /// Sign every input of `tx` with `priv_key`, resolving the referenced
    /// prior transactions from the chain
    pub fn sign_transaction(&self, tx: &mut Transaction, priv_key: &SigningKey) -> Result<()> {
        let prev_txs = self.input_txs_of(tx)?;
        tx.sign(priv_key, &prev_txs)
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{block}")?;
        }
        Ok(())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
