use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Protocol version carried by every cross-layer message.
pub const MESSAGE_VERSION: u64 = 1;

/// An L1-side endpoint of a cross-chain message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct L1Actor {
    /// Contract address on the base layer.
    pub address: Address,
    /// Base-layer chain id.
    pub chain_id: u64,
}

impl L1Actor {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self { address, chain_id }
    }
}

/// An L2-side endpoint of a cross-chain message.
///
/// L2 addresses are opaque field elements, not 20-byte Ethereum addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct L2Actor {
    /// Contract identifier on the rollup.
    pub address: B256,
    /// Rollup protocol version.
    pub version: u64,
}

impl L2Actor {
    pub fn new(address: B256, version: u64) -> Self {
        Self { address, version }
    }
}
