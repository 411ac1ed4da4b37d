use alloy_primitives::{Address, address};

/// JSDAO token decimals
pub const JSDAO_DECIMALS: u8 = 18;

/// Contribution bounds, in whole JSDAO
pub const MIN_CONTRIBUTION_JSDAO: u64 = 100;
pub const MAX_CONTRIBUTION_JSDAO: u64 = 100_000;

pub const MAX_MEMO_LENGTH: usize = 140;
pub const MIN_EMPLOYER_NAME_LENGTH: usize = 2;

/// Gas limit forced on `joinDAO`, which the node tends to underestimate
pub const JOIN_DAO_GAS_LIMIT: u64 = 1_000_000;

pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Ethereum mainnet
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Placeholder until a deployment address is configured
pub const UNSET_CONTRACT: Address = address!("0x0000000000000000000000000000000000000000");
