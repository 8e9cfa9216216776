use alloy::primitives::{B256, hex};

/// Reference to a parent-chain block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockRef {
    pub hash: B256,
    pub number: u64,
    pub parent_hash: B256,
    pub timestamp: u64,
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // short hash form for log context
        write!(f, "{}:0x{}", self.number, hex::encode(&self.hash[..4]))
    }
}

/// Identifies one blob by its position in the ordered list of blob hashes
/// attached to a block's transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedDataHash {
    pub index: u64,
    pub data_hash: B256,
}
