// Peer: owner of one chain replica

use crate::chain::Blockchain;
use crate::core::{Block, Hash256, Transaction};
use crate::error::{Error, Result};
use crate::wallet::KeyPair;
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};

/// A peer owns its chain replica exclusively: the replica sits behind a
/// per-peer mutex and the only mutators are the peer's own mining path and
/// the task draining its inbound queue. Other peers never touch it; blocks
/// travel by copy through the bounded inbound channels.
pub struct Peer {
    name: String,
    keypair: KeyPair,
    chain: Mutex<Blockchain>,
    /// Peer name -> that peer's address
    address_book: HashMap<String, String>,
    /// Peer name -> sender half of that peer's inbound block queue
    broadcast_map: HashMap<String, mpsc::Sender<Block>>,
}

impl Peer {
    pub(crate) fn new(
        name: String,
        keypair: KeyPair,
        chain: Blockchain,
        address_book: HashMap<String, String>,
        broadcast_map: HashMap<String, mpsc::Sender<Block>>,
    ) -> Peer {
        Peer {
            name,
            keypair,
            chain: Mutex::new(chain),
            address_book,
            broadcast_map,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        self.keypair.address()
    }

    /// Look up another peer's address in this peer's address book
    pub fn resolve(&self, peer_name: &str) -> Result<&str> {
        self.address_book
            .get(peer_name)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownPeer(peer_name.to_string()))
    }

    /// Build and sign a transfer of `amount` to `to_address`, funded from
    /// this peer's spendable outputs as seen by its own replica
    pub async fn produce_transfer_tx(&self, to_address: &str, amount: i64) -> Result<Transaction> {
        let chain = self.chain.lock().await;
        let utxos = chain.find_utxo_set();
        let mut tx = Transaction::new_utxo(self.keypair.pub_key(), to_address, amount, &utxos)?;
        chain.sign_transaction(&mut tx, self.keypair.signing_key())?;
        Ok(tx)
    }

    /// Mine a block carrying `tx` plus a coinbase paying this peer.
    /// The transaction is re-verified against this peer's own replica first;
    /// nothing is mined (or broadcast) when it does not check out.
    pub async fn mine_transaction(&self, tx: Transaction) -> Result<Block> {
        let mut chain = self.chain.lock().await;
        if !chain.verify_transaction(&tx) {
            return Err(Error::InvalidSignature);
        }
        let coinbase = Transaction::new_coinbase(self.keypair.address(), "")?;
        let block = chain.mine_block(vec![coinbase, tx])?;
        log::info!(
            "{}: mined block {} at height {}",
            self.name,
            block.hash,
            chain.len() - 1
        );
        Ok(block)
    }

    /// Enqueue a copy of `block` on every other peer's inbound queue.
    /// A full queue blocks the sender until space frees up.
    pub async fn broadcast(&self, block: &Block) {
        for (peer_name, queue) in &self.broadcast_map {
            if queue.send(block.clone()).await.is_err() {
                log::warn!("{}: inbound queue of '{peer_name}' is closed", self.name);
            }
        }
    }

    /// Validate and append a block received from another peer: its
    /// proof-of-work must hold, every transaction must verify against this
    /// replica, and it must extend the local tip
    pub async fn handle_inbound(&self, block: Block) -> Result<()> {
        let mut chain = self.chain.lock().await;
        if !chain.validate_block(&block) {
            return Err(Error::InvalidBlock);
        }
        for tx in &block.transactions {
            if !chain.verify_transaction(tx) {
                return Err(Error::InvalidSignature);
            }
        }
        chain.append_block(block)
    }

    /// Sum of all outputs this peer's key can spend
    pub async fn balance(&self) -> i64 {
        let chain = self.chain.lock().await;
        chain
            .find_utxo_set()
            .find_utxo(&self.keypair.pub_key_hash())
            .iter()
            .map(|output| output.value)
            .sum()
    }

    pub async fn chain_len(&self) -> usize {
        self.chain.lock().await.len()
    }

    pub async fn tip_hash(&self) -> Hash256 {
        self.chain.lock().await.tip().hash
    }

    /// Detailed listing of the current tip block
    pub async fn tip_detail(&self) -> String {
        self.chain.lock().await.tip().detail()
    }

    /// Printable listing of the whole replica
    pub async fn chain_string(&self) -> String {
        self.chain.lock().await.to_string()
    }
}
