// Key management and addresses

mod keystore;

pub use keystore::{
    get_address, hash_pubkey, pubkey_hash_from_address, validate_address, KeyPair,
};
