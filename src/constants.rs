// Protocol constants

/// Value paid out by every coinbase transaction.
pub const BLOCK_REWARD: i64 = 10;

/// Mining difficulty: a block hash must be numerically below
/// `2^(256 - TARGET_BITS)` interpreted as a big-endian integer.
pub const TARGET_BITS: u32 = 8;

/// Seed data carried by the genesis coinbase input.
pub const GENESIS_COINBASE_DATA: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

/// Length of the random alphanumeric seed placed in a coinbase input
/// when the caller provides none.
pub const COINBASE_SEED_LEN: usize = 10;

/// Bounded capacity of every peer's inbound block queue.
pub const INBOUND_QUEUE_CAPACITY: usize = 8;
