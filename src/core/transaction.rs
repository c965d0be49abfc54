// Transaction data structures and signing

use crate::chain::UtxoSet;
use crate::constants::{BLOCK_REWARD, COINBASE_SEED_LEN};
use crate::core::serialize::{
    read_i32, read_i64, read_u32, read_var_bytes, write_i32, write_i64, write_u32,
    write_var_bytes,
};
use crate::core::{sha256, Hash256};
use crate::error::{Error, Result};
use crate::wallet::{hash_pubkey, pubkey_hash_from_address};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::{EncodedPoint, FieldBytes};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;

/// Transaction input - spends an output of a prior transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// ID of the transaction holding the output being spent.
    /// `Hash256::ZERO` for a coinbase input.
    pub prev_tx_id: Hash256,
    /// Index of the output in the previous transaction; -1 marks coinbase
    pub out_index: i32,
    /// Raw `R‖S` ECDSA signature, both scalars 32 bytes.
    /// Empty before signing and in trimmed copies.
    pub signature: Vec<u8>,
    /// Uncompressed public key as `X‖Y` (32 bytes each).
    /// For a coinbase input this holds arbitrary seed data instead.
    pub pub_key: Vec<u8>,
}

/// Transaction output - value locked to a public key hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: i64,
    /// RIPEMD160(SHA256(pub_key)) of the owner, 20 bytes
    pub pub_key_hash: Vec<u8>,
}

impl TxOutput {
    /// Check whether the output can be spent by the owner of `pub_key_hash`
    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash == pub_key_hash
    }
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// SHA-256 of the serialized transaction with this field zeroed
    pub id: Hash256,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
}

impl Transaction {
    /// Create a coinbase transaction paying `BLOCK_REWARD` to `to`.
    /// When `data` is empty, a random alphanumeric seed is generated so
    /// every coinbase hashes to a distinct ID.
    pub fn new_coinbase(to: &str, data: &str) -> Result<Transaction> {
        let seed = if data.is_empty() {
            random_seed(COINBASE_SEED_LEN)
        } else {
            data.to_string()
        };
        let input = TxInput {
            prev_tx_id: Hash256::ZERO,
            out_index: -1,
            signature: Vec::new(),
            pub_key: seed.into_bytes(),
        };
        let output = TxOutput {
            value: BLOCK_REWARD,
            pub_key_hash: pubkey_hash_from_address(to)?,
        };
        let mut tx = Transaction {
            id: Hash256::ZERO,
            vin: vec![input],
            vout: vec![output],
        };
        tx.id = tx.hash();
        Ok(tx)
    }

    /// Build an unsigned transaction spending the sender's outputs.
    ///
    /// Collects spendable outputs for the sender's key from `utxos`, fails
    /// with `NotEnoughFunds` if they do not cover `amount`, and emits one
    /// output to the recipient plus a change output back to the sender when
    /// the accumulated value exceeds the amount. The caller must sign the
    /// result before it can be mined.
    pub fn new_utxo(
        sender_pub_key: &[u8],
        to: &str,
        amount: i64,
        utxos: &UtxoSet,
    ) -> Result<Transaction> {
        if amount <= 0 {
            return Err(Error::NotEnoughFunds);
        }
        let sender_pkh = hash_pubkey(sender_pub_key);
        let (accumulated, spendable) = utxos.find_spendable_outputs(&sender_pkh, amount);
        if accumulated < amount {
            return Err(Error::NotEnoughFunds);
        }

        let mut vin = Vec::new();
        for (tx_id, out_indexes) in spendable {
            for out_index in out_indexes {
                vin.push(TxInput {
                    prev_tx_id: tx_id,
                    out_index: out_index as i32,
                    signature: Vec::new(),
                    pub_key: sender_pub_key.to_vec(),
                });
            }
        }

        let mut vout = vec![TxOutput {
            value: amount,
            pub_key_hash: pubkey_hash_from_address(to)?,
        }];
        if accumulated > amount {
            vout.push(TxOutput {
                value: accumulated - amount,
                pub_key_hash: sender_pkh,
            });
        }

        let mut tx = Transaction {
            id: Hash256::ZERO,
            vin,
            vout,
        };
        tx.id = tx.hash();
        Ok(tx)
    }

    /// Check whether the transaction is a coinbase
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].out_index == -1
    }

    /// Hash of the transaction with its `id` field zeroed
    pub fn hash(&self) -> Hash256 {
        let mut copy = self.clone();
        copy.id = Hash256::ZERO;
        sha256(&copy.serialize())
    }

    /// Copy with every input's signature and public key cleared.
    /// Its serialization is the exact payload that is signed and verified.
    pub fn trimmed_copy(&self) -> Transaction {
        let vin = self
            .vin
            .iter()
            .map(|input| TxInput {
                prev_tx_id: input.prev_tx_id,
                out_index: input.out_index,
                signature: Vec::new(),
                pub_key: Vec::new(),
            })
            .collect();
        Transaction {
            id: self.id,
            vin,
            vout: self.vout.clone(),
        }
    }

    /// Sign every input with the sender's private key.
    ///
    /// `prev_txs` must contain the prior transaction of every input; an
    /// absent entry, or a prior transaction with no output locked to the
    /// input's public key, fails with `TxInputNotFound`. Coinbase
    /// transactions are not signed.
    pub fn sign(
        &mut self,
        priv_key: &SigningKey,
        prev_txs: &HashMap<Hash256, Transaction>,
    ) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }
        for input in &self.vin {
            let prev_tx = prev_txs
                .get(&input.prev_tx_id)
                .ok_or(Error::TxInputNotFound)?;
            let input_pkh = hash_pubkey(&input.pub_key);
            if !prev_tx
                .vout
                .iter()
                .any(|out| out.is_locked_with_key(&input_pkh))
            {
                return Err(Error::TxInputNotFound);
            }
        }

        let payload = self.trimmed_copy().serialize();
        let signature: Signature = priv_key.sign(&payload);
        // to_bytes yields r‖s with both scalars left-padded to 32 bytes
        let signature = signature.to_bytes().to_vec();
        for input in &mut self.vin {
            input.signature = signature.clone();
        }
        Ok(())
    }

    /// Verify the signature of every input. Trivially true for coinbase.
    pub fn verify(&self, prev_txs: &HashMap<Hash256, Transaction>) -> bool {
        if self.is_coinbase() {
            return true;
        }
        for input in &self.vin {
            let Some(prev_tx) = prev_txs.get(&input.prev_tx_id) else {
                return false;
            };
            let input_pkh = hash_pubkey(&input.pub_key);
            if !prev_tx
                .vout
                .iter()
                .any(|out| out.is_locked_with_key(&input_pkh))
            {
                return false;
            }
        }

        let payload = self.trimmed_copy().serialize();
        for input in &self.vin {
            let Ok(signature) = Signature::from_slice(&input.signature) else {
                return false;
            };
            // pub_key splits into equal halves (X, Y), 32 bytes each
            if input.pub_key.len() != 64 {
                return false;
            }
            let (x, y) = input.pub_key.split_at(input.pub_key.len() / 2);
            let point = EncodedPoint::from_affine_coordinates(
                FieldBytes::from_slice(x),
                FieldBytes::from_slice(y),
                false,
            );
            let Ok(pub_key) = VerifyingKey::from_encoded_point(&point) else {
                return false;
            };
            if pub_key.verify(&payload, &signature).is_err() {
                return false;
            }
        }
        true
    }

    /// Deterministic serialization; see `core::serialize` for the encoding
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        write_var_bytes(&mut buf, self.id.as_bytes()).unwrap();
        write_u32(&mut buf, self.vin.len() as u32).unwrap();
        for input in &self.vin {
            write_var_bytes(&mut buf, input.prev_tx_id.as_bytes()).unwrap();
            write_i32(&mut buf, input.out_index).unwrap();
            write_var_bytes(&mut buf, &input.signature).unwrap();
            write_var_bytes(&mut buf, &input.pub_key).unwrap();
        }
        write_u32(&mut buf, self.vout.len() as u32).unwrap();
        for output in &self.vout {
            write_i64(&mut buf, output.value).unwrap();
            write_var_bytes(&mut buf, &output.pub_key_hash).unwrap();
        }
        buf
    }

    /// Decode a transaction previously produced by `serialize`
    pub fn deserialize(data: &[u8]) -> Result<Transaction> {
        let mut cursor = Cursor::new(data);

        let id = Hash256::from_slice(&read_var_bytes(&mut cursor)?)?;

        let vin_count = read_u32(&mut cursor)? as usize;
        let mut vin = Vec::with_capacity(vin_count);
        for _ in 0..vin_count {
            let prev_tx_id = Hash256::from_slice(&read_var_bytes(&mut cursor)?)?;
            let out_index = read_i32(&mut cursor)?;
            let signature = read_var_bytes(&mut cursor)?;
            let pub_key = read_var_bytes(&mut cursor)?;
            vin.push(TxInput {
                prev_tx_id,
                out_index,
                signature,
                pub_key,
            });
        }

        let vout_count = read_u32(&mut cursor)? as usize;
        let mut vout = Vec::with_capacity(vout_count);
        for _ in 0..vout_count {
            let value = read_i64(&mut cursor)?;
            let pub_key_hash = read_var_bytes(&mut cursor)?;
            vout.push(TxOutput {
                value,
                pub_key_hash,
            });
        }

        Ok(Transaction { id, vin, vout })
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "--- Transaction {}:", self.id)?;
        for (i, input) in self.vin.iter().enumerate() {
            writeln!(f, "     Input {i}:")?;
            writeln!(f, "       TXID:   {}", input.prev_tx_id)?;
            writeln!(f, "       OutIdx: {}", input.out_index)?;
            writeln!(f, "       PubKey: {}", hex::encode(&input.pub_key))?;
        }
        for (i, output) in self.vout.iter().enumerate() {
            writeln!(f, "     Output {i}:")?;
            writeln!(f, "       Value:      {}", output.value)?;
            writeln!(f, "       PubKeyHash: {}", hex::encode(&output.pub_key_hash))?;
        }
        Ok(())
    }
}

fn random_seed(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
