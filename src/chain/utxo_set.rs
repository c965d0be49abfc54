// In-memory UTXO index
//
// Maps a transaction ID to the still-unspent outputs of that transaction,
// keyed by output index. Derived state: rebuildable by replaying `update`
// over every block from genesis.

use crate::core::{Hash256, Transaction, TxOutput};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSet {
    outputs: HashMap<Hash256, BTreeMap<u32, TxOutput>>,
}

impl UtxoSet {
    pub fn new() -> UtxoSet {
        UtxoSet::default()
    }

    /// Accumulate every output locked with `pub_key_hash`, returning the
    /// total value and the chosen outputs grouped by transaction ID.
    ///
    /// All matching outputs are collected, not a minimal covering subset;
    /// the caller decides whether the total covers the requested amount.
    pub fn find_spendable_outputs(
        &self,
        pub_key_hash: &[u8],
        _amount: i64,
    ) -> (i64, HashMap<Hash256, Vec<u32>>) {
        let mut spendable: HashMap<Hash256, Vec<u32>> = HashMap::new();
        let mut accumulated = 0i64;
        for (tx_id, outputs) in &self.outputs {
            for (&out_index, output) in outputs {
                if output.is_locked_with_key(pub_key_hash) {
                    accumulated += output.value;
                    spendable.entry(*tx_id).or_default().push(out_index);
                }
            }
        }
        (accumulated, spendable)
    }

    /// All outputs locked with `pub_key_hash`, without their locations
    pub fn find_utxo(&self, pub_key_hash: &[u8]) -> Vec<TxOutput> {
        self.outputs
            .values()
            .flat_map(|outputs| outputs.values())
            .filter(|output| output.is_locked_with_key(pub_key_hash))
            .cloned()
            .collect()
    }

    /// Look up a single unspent output
    pub fn get(&self, tx_id: &Hash256, out_index: u32) -> Option<&TxOutput> {
        self.outputs.get(tx_id)?.get(&out_index)
    }

    /// Apply a block's transactions in order: consumed outputs are removed
    /// (absence is tolerated silently), produced outputs are inserted.
    /// Each block must be applied exactly once per reconstruction; replaying
    /// a block is not idempotent.
    pub fn update(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            if !tx.is_coinbase() {
                for input in &tx.vin {
                    let Ok(out_index) = u32::try_from(input.out_index) else {
                        continue;
                    };
                    if let Some(outputs) = self.outputs.get_mut(&input.prev_tx_id) {
                        outputs.remove(&out_index);
                        if outputs.is_empty() {
                            self.outputs.remove(&input.prev_tx_id);
                        }
                    }
                }
            }
            let entry = self.outputs.entry(tx.id).or_default();
            for (out_index, output) in tx.vout.iter().enumerate() {
                entry.insert(out_index as u32, output.clone());
            }
        }
    }

    /// Number of unspent outputs across all transactions
    pub fn count(&self) -> usize {
        self.outputs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BLOCK_REWARD, GENESIS_COINBASE_DATA};
    use crate::core::TxInput;

    // Fixture transaction flow:
    //   tx0: genesis coinbase, 10 coins to pkh 2b02…
    //   tx1: 2b02… sends 5 coins to b8f3… and keeps 5 as change
    // plus the miner's own coinbase paying pkh 15e5… per mined block.
    const TX0_ID: &str = "9402c56f49de02d2b9c4633837d82e3881227a3ea90c4073c02815fdcf5afaa2";
    const TX1_ID: &str = "397b990007845099b4fe50ba23490f277b3bf6f5316b4082c343b14c5504ab13";
    const MINER_CB1_ID: &str = "0ca136effc2424a42d2bcf6b498e7c0c226ada6eff5499a7fa600c0ae6bad9c0";
    const OWNER_PKH: &str = "2b02ea4c157844ec0b034fdde3379726ea228b38";
    const RECIPIENT_PKH: &str = "b8f3e65b3cabc93fb9459b7e8182fa5ec4e58f04";
    const MINER_PKH: &str = "15e5ab1b9f1e79b58c95a1a0b3caa63c61617971";
    const SENDER_PUB_KEY: &str = "f86aa0caf08359ee4227d2901ab490172c69a801910f4140cdde2f5dc8f8bb3d\
                                  c19da2c9fb0ed041db106a8fea0382de25edbc83df6893574e40fc2e1e493748";

    fn output(value: i64, pkh_hex: &str) -> TxOutput {
        TxOutput {
            value,
            pub_key_hash: hex::decode(pkh_hex).unwrap(),
        }
    }

    fn tx0() -> Transaction {
        Transaction {
            id: Hash256::from_hex(TX0_ID).unwrap(),
            vin: vec![TxInput {
                prev_tx_id: Hash256::ZERO,
                out_index: -1,
                signature: Vec::new(),
                pub_key: GENESIS_COINBASE_DATA.as_bytes().to_vec(),
            }],
            vout: vec![output(BLOCK_REWARD, OWNER_PKH)],
        }
    }

    fn tx1() -> Transaction {
        Transaction {
            id: Hash256::from_hex(TX1_ID).unwrap(),
            vin: vec![TxInput {
                prev_tx_id: Hash256::from_hex(TX0_ID).unwrap(),
                out_index: 0,
                signature: Vec::new(),
                pub_key: hex::decode(SENDER_PUB_KEY).unwrap(),
            }],
            vout: vec![output(5, RECIPIENT_PKH), output(5, OWNER_PKH)],
        }
    }

    fn miner_coinbase_1() -> Transaction {
        Transaction {
            id: Hash256::from_hex(MINER_CB1_ID).unwrap(),
            vin: vec![TxInput {
                prev_tx_id: Hash256::ZERO,
                out_index: -1,
                signature: Vec::new(),
                pub_key: b"1".to_vec(),
            }],
            vout: vec![output(BLOCK_REWARD, MINER_PKH)],
        }
    }

    fn set_of(entries: &[(&str, &[(u32, TxOutput)])]) -> UtxoSet {
        let mut set = UtxoSet::new();
        for (tx_id, outputs) in entries {
            let inner = set
                .outputs
                .entry(Hash256::from_hex(tx_id).unwrap())
                .or_default();
            for (out_index, output) in *outputs {
                inner.insert(*out_index, output.clone());
            }
        }
        set
    }

    #[test]
    fn test_update_with_genesis_coinbase() {
        let mut utxos = UtxoSet::new();
        utxos.update(&[tx0()]);

        let expected = set_of(&[(TX0_ID, &[(0, output(BLOCK_REWARD, OWNER_PKH))])]);
        assert_eq!(utxos, expected);
        assert_eq!(utxos.count(), 1);
    }

    #[test]
    fn test_update_spends_and_credits() {
        let mut utxos = set_of(&[(TX0_ID, &[(0, output(BLOCK_REWARD, OWNER_PKH))])]);
        utxos.update(&[miner_coinbase_1(), tx1()]);

        let expected = set_of(&[
            (
                TX1_ID,
                &[(0, output(5, RECIPIENT_PKH)), (1, output(5, OWNER_PKH))],
            ),
            (MINER_CB1_ID, &[(0, output(BLOCK_REWARD, MINER_PKH))]),
        ]);
        assert_eq!(utxos, expected);
        assert!(utxos.get(&Hash256::from_hex(TX0_ID).unwrap(), 0).is_none());
    }

    #[test]
    fn test_update_prunes_empty_entries() {
        let mut utxos = UtxoSet::new();
        utxos.update(&[tx0()]);
        utxos.update(&[tx1()]);
        // tx0's only output was spent, so its entry is gone entirely
        assert!(!utxos
            .outputs
            .contains_key(&Hash256::from_hex(TX0_ID).unwrap()));
    }

    #[test]
    fn test_update_tolerates_absent_inputs() {
        let mut utxos = UtxoSet::new();
        // spend an output this set never saw
        utxos.update(&[tx1()]);
        assert_eq!(utxos.count(), 2);
        assert!(utxos.get(&Hash256::from_hex(TX1_ID).unwrap(), 0).is_some());
    }

    #[test]
    fn test_find_spendable_outputs_accumulates_everything() {
        let utxos = set_of(&[(TX0_ID, &[(0, output(BLOCK_REWARD, OWNER_PKH))])]);
        let pkh = hex::decode(OWNER_PKH).unwrap();

        // the whole balance comes back even though 3 would suffice
        let (accumulated, spendable) = utxos.find_spendable_outputs(&pkh, 3);
        assert_eq!(accumulated, 10);
        assert_eq!(
            spendable,
            HashMap::from([(Hash256::from_hex(TX0_ID).unwrap(), vec![0])])
        );
    }

    #[test]
    fn test_find_spendable_outputs_for_unknown_key() {
        let utxos = set_of(&[(TX0_ID, &[(0, output(BLOCK_REWARD, OWNER_PKH))])]);
        let (accumulated, spendable) = utxos.find_spendable_outputs(&[0u8; 20], 1);
        assert_eq!(accumulated, 0);
        assert!(spendable.is_empty());
    }

    #[test]
    fn test_find_utxo_lists_outputs_without_locations() {
        let mut utxos = UtxoSet::new();
        utxos.update(&[tx0()]);
        utxos.update(&[miner_coinbase_1(), tx1()]);

        let owner = utxos.find_utxo(&hex::decode(OWNER_PKH).unwrap());
        assert_eq!(owner.len(), 1);
        assert_eq!(owner[0].value, 5);

        let miner = utxos.find_utxo(&hex::decode(MINER_PKH).unwrap());
        assert_eq!(miner.len(), 1);
        assert_eq!(miner[0].value, BLOCK_REWARD);
    }

    #[test]
    fn test_count_sums_inner_maps() {
        let mut utxos = UtxoSet::new();
        assert_eq!(utxos.count(), 0);
        assert!(utxos.is_empty());

        utxos.update(&[tx0()]);
        utxos.update(&[miner_coinbase_1(), tx1()]);
        assert_eq!(utxos.count(), 3);
        assert!(!utxos.is_empty());
    }
}
