// Key pairs and Base58Check addresses

use crate::core::{double_sha256, hash160};
use crate::error::{Error, Result};
use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;

/// Version byte prefixed to the public key hash in an address payload
const VERSION: u8 = 0x00;
/// Trailing checksum bytes of an address payload
const CHECKSUM_LEN: usize = 4;

/// ECDSA key pair over NIST P-256 together with its derived address.
///
/// The private key never leaves this struct; transactions and blocks only
/// ever embed the public key bytes.
pub struct KeyPair {
    signing_key: SigningKey,
    pub_key: Vec<u8>,
    address: String,
}

impl KeyPair {
    /// Generate a fresh random key pair
    pub fn generate() -> KeyPair {
        let signing_key = SigningKey::random(&mut OsRng);
        let point = signing_key.verifying_key().to_encoded_point(false);
        // drop the SEC1 0x04 tag: X‖Y, both coordinates padded to 32 bytes
        let pub_key = point.as_bytes()[1..].to_vec();
        let address = get_address(&pub_key);
        KeyPair {
            signing_key,
            pub_key,
            address,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Uncompressed public key as `X‖Y`, 64 bytes
    pub fn pub_key(&self) -> &[u8] {
        &self.pub_key
    }

    /// RIPEMD160(SHA256(pub_key)), 20 bytes
    pub fn pub_key_hash(&self) -> Vec<u8> {
        hash_pubkey(&self.pub_key)
    }

    /// Base58Check address derived from the public key
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Hash a public key: RIPEMD160(SHA256(pub_key))
pub fn hash_pubkey(pub_key: &[u8]) -> Vec<u8> {
    hash160(pub_key).to_vec()
}

/// First four bytes of the double SHA-256 of `payload`
fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(payload);
    let mut result = [0u8; CHECKSUM_LEN];
    result.copy_from_slice(&digest[..CHECKSUM_LEN]);
    result
}

/// Derive the address for a public key:
/// `Base58(version ‖ hash_pubkey(pub_key) ‖ checksum)`
pub fn get_address(pub_key: &[u8]) -> String {
    let mut payload = vec![VERSION];
    payload.extend_from_slice(&hash_pubkey(pub_key));
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    bs58::encode(payload).into_string()
}

/// Extract the public key hash from an address, discarding the version
/// byte and the checksum
pub fn pubkey_hash_from_address(address: &str) -> Result<Vec<u8>> {
    let decoded = decode_address(address)?;
    Ok(decoded[1..decoded.len() - CHECKSUM_LEN].to_vec())
}

/// Check that an address decodes and its checksum matches
pub fn validate_address(address: &str) -> Result<()> {
    let decoded = decode_address(address)?;
    let (payload, check) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if check != checksum(payload) {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    Ok(())
}

fn decode_address(address: &str) -> Result<Vec<u8>> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|_| Error::InvalidAddress(address.to_string()))?;
    if decoded.len() <= 1 + CHECKSUM_LEN {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    Ok(decoded)
}
