// Error types shared across the crate

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("transaction not found")]
    TxNotFound,

    #[error("there is no valid transaction")]
    NoValidTx,

    #[error("block not found")]
    BlockNotFound,

    #[error("block is not valid")]
    InvalidBlock,

    #[error("not enough funds")]
    NotEnoughFunds,

    #[error("transaction input not found")]
    TxInputNotFound,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("signature is not valid")]
    InvalidSignature,

    #[error("merkle leaf not found")]
    LeafNotFound,

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
