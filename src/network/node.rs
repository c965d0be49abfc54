// Orchestrator: peer creation, genesis seeding, transfer routing

use crate::chain::Blockchain;
use crate::constants::INBOUND_QUEUE_CAPACITY;
use crate::core::Block;
use crate::error::{Error, Result};
use crate::network::Peer;
use crate::wallet::KeyPair;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates the peers, seeds every replica with the same genesis block, and
/// routes transfer requests: the sender produces and signs a transaction,
/// the designated miner verifies and mines it, and the mined block is
/// broadcast to every other peer's inbound queue.
pub struct Node {
    names: Vec<String>,
    peers: HashMap<String, Arc<Peer>>,
    /// Receiver halves of the inbound queues, consumed by `start`
    inboxes: Vec<(Arc<Peer>, mpsc::Receiver<Block>)>,
}

impl Node {
    /// Create one peer per name. The genesis block pays the first peer;
    /// every replica starts from a deep copy of the same genesis chain.
    pub fn new(names: &[String]) -> Result<Node> {
        let keypairs: HashMap<String, KeyPair> = names
            .iter()
            .map(|name| (name.clone(), KeyPair::generate()))
            .collect();
        let addresses: HashMap<String, String> = keypairs
            .iter()
            .map(|(name, keypair)| (name.clone(), keypair.address().to_string()))
            .collect();

        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for name in names {
            let (sender, receiver) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
            senders.insert(name.clone(), sender);
            receivers.insert(name.clone(), receiver);
        }

        let genesis_chain = Blockchain::new(&addresses[&names[0]])?;
        log::info!(
            "genesis block {} pays peer '{}'",
            genesis_chain.genesis_block().hash,
            names[0]
        );

        let mut keypairs = keypairs;
        let mut peers = HashMap::new();
        let mut inboxes = Vec::new();
        for name in names {
            let address_book: HashMap<String, String> = addresses
                .iter()
                .filter(|(other, _)| *other != name)
                .map(|(other, address)| (other.clone(), address.clone()))
                .collect();
            let broadcast_map: HashMap<String, mpsc::Sender<Block>> = senders
                .iter()
                .filter(|(other, _)| *other != name)
                .map(|(other, sender)| (other.clone(), sender.clone()))
                .collect();
            let keypair = keypairs.remove(name).expect("one key pair per peer");
            let receiver = receivers.remove(name).expect("one queue per peer");

            let peer = Arc::new(Peer::new(
                name.clone(),
                keypair,
                genesis_chain.clone(),
                address_book,
                broadcast_map,
            ));
            inboxes.push((Arc::clone(&peer), receiver));
            peers.insert(name.clone(), peer);
        }

        Ok(Node {
            names: names.to_vec(),
            peers,
            inboxes,
        })
    }

    /// Spawn one inbound task per peer. Each task drains its peer's queue
    /// one block at a time; a rejected block is logged and the task keeps
    /// serving.
    pub fn start(&mut self) {
        for (peer, mut receiver) in self.inboxes.drain(..) {
            tokio::spawn(async move {
                while let Some(block) = receiver.recv().await {
                    match peer.handle_inbound(block).await {
                        Ok(()) => log::info!(
                            "{}: appended inbound block, chain length {}",
                            peer.name(),
                            peer.chain_len().await
                        ),
                        Err(err) => {
                            log::warn!("{}: rejected inbound block: {err}", peer.name())
                        }
                    }
                }
            });
        }
    }

    /// Transfer `amount` from `from` to `to`, mined by `miner`.
    /// The mined block lands on every other peer's inbound queue.
    pub async fn transfer(&self, from: &str, to: &str, miner: &str, amount: i64) -> Result<()> {
        let sender = self.peer(from)?;
        let miner = self.peer(miner)?;
        let to_address = sender.resolve(to)?.to_string();

        let tx = sender.produce_transfer_tx(&to_address, amount).await?;
        let block = miner.mine_transaction(tx).await?;
        miner.broadcast(&block).await;
        Ok(())
    }

    pub fn peer(&self, name: &str) -> Result<&Arc<Peer>> {
        self.peers
            .get(name)
            .ok_or_else(|| Error::UnknownPeer(name.to_string()))
    }

    /// Peers in creation order
    pub fn peers(&self) -> impl Iterator<Item = &Arc<Peer>> {
        self.names.iter().filter_map(|name| self.peers.get(name))
    }

    pub fn peer_names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLOCK_REWARD;
    use std::time::Duration;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn wait_for_chain_len(node: &Node, len: usize) {
        for _ in 0..250 {
            let mut done = true;
            for peer in node.peers() {
                if peer.chain_len().await != len {
                    done = false;
                    break;
                }
            }
            if done {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("peers did not reach chain length {len}");
    }

    #[tokio::test]
    async fn test_all_replicas_share_genesis() {
        let node = Node::new(&names(&["a", "b", "c"])).unwrap();

        let tip_a = node.peer("a").unwrap().tip_hash().await;
        for peer in node.peers() {
            assert_eq!(peer.chain_len().await, 1);
            assert_eq!(peer.tip_hash().await, tip_a);
        }
        // genesis pays the first peer
        assert_eq!(node.peer("a").unwrap().balance().await, BLOCK_REWARD);
        assert_eq!(node.peer("b").unwrap().balance().await, 0);
        assert_eq!(node.peer("c").unwrap().balance().await, 0);
    }

    #[tokio::test]
    async fn test_transfer_replicates_to_every_peer() {
        let mut node = Node::new(&names(&["a", "b", "c"])).unwrap();
        node.start();

        node.transfer("a", "b", "a", BLOCK_REWARD / 2).await.unwrap();
        wait_for_chain_len(&node, 2).await;

        // reward for mining plus the change of the spent genesis output
        assert_eq!(
            node.peer("a").unwrap().balance().await,
            BLOCK_REWARD + BLOCK_REWARD / 2
        );
        assert_eq!(
            node.peer("b").unwrap().balance().await,
            BLOCK_REWARD / 2
        );
        assert_eq!(node.peer("c").unwrap().balance().await, 0);

        let tip_a = node.peer("a").unwrap().tip_hash().await;
        for peer in node.peers() {
            assert_eq!(peer.chain_len().await, 2);
            assert_eq!(peer.tip_hash().await, tip_a);
        }
    }

    #[tokio::test]
    async fn test_chained_transfers() {
        let mut node = Node::new(&names(&["a", "b", "c"])).unwrap();
        node.start();

        node.transfer("a", "b", "a", 5).await.unwrap();
        wait_for_chain_len(&node, 2).await;
        node.transfer("b", "c", "a", 2).await.unwrap();
        wait_for_chain_len(&node, 3).await;

        // a: genesis change 5 + two mining rewards
        assert_eq!(node.peer("a").unwrap().balance().await, 5 + 2 * BLOCK_REWARD);
        // b: received 5, spent 2
        assert_eq!(node.peer("b").unwrap().balance().await, 3);
        assert_eq!(node.peer("c").unwrap().balance().await, 2);
    }

    #[tokio::test]
    async fn test_transfer_with_insufficient_funds_leaves_chains_untouched() {
        let mut node = Node::new(&names(&["a", "b", "c"])).unwrap();
        node.start();

        let result = node.transfer("b", "c", "a", 1).await;
        assert_eq!(result.unwrap_err(), Error::NotEnoughFunds);
        for peer in node.peers() {
            assert_eq!(peer.chain_len().await, 1);
        }
    }

    #[tokio::test]
    async fn test_transfer_to_unknown_peer() {
        let node = Node::new(&names(&["a", "b", "c"])).unwrap();
        assert!(matches!(
            node.transfer("a", "z", "a", 1).await,
            Err(Error::UnknownPeer(_))
        ));
        assert!(matches!(
            node.transfer("z", "a", "a", 1).await,
            Err(Error::UnknownPeer(_))
        ));
    }
}
