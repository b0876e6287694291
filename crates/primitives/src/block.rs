//! Block, header, and transaction types.

use alloy_primitives::{B256, Bytes, keccak256};
use alloy_rlp::{Encodable, RlpDecodable, RlpEncodable};

/// A block header.
///
/// The header does not carry a height; a block's height is defined by its
/// position in the chain index, not by its contents.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct BlockHeader {
    /// Hash of the parent block's header. [`B256::ZERO`] for genesis.
    pub parent_hash: B256,
    /// Commitment to the post-state of this block.
    pub state_root: B256,
    /// Commitment to the transactions in this block.
    pub transactions_root: B256,
    /// Unix timestamp the block was produced at.
    pub timestamp: u64,
    /// Proof-of-work nonce.
    pub nonce: u64,
}

impl BlockHeader {
    /// Returns the keccak256 hash of the RLP-encoded header, which is the
    /// block's identity everywhere in the node.
    pub fn hash(&self) -> B256 {
        let mut out = Vec::with_capacity(self.length());
        self.encode(&mut out);
        keccak256(&out)
    }
}

/// An opaque transaction payload.
///
/// Script and signature semantics live in the execution layer; storage only
/// needs the payload bytes and a stable hash.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Transaction {
    /// Raw transaction payload.
    pub payload: Bytes,
}

impl Transaction {
    /// Creates a transaction from raw payload bytes.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self { payload: payload.into() }
    }

    /// Returns the keccak256 hash of the RLP-encoded transaction.
    pub fn hash(&self) -> B256 {
        let mut out = Vec::with_capacity(self.length());
        self.encode(&mut out);
        keccak256(&out)
    }
}

/// A full block: header plus transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// The transactions contained in the block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Returns the block hash, i.e. the hash of the header.
    pub fn hash(&self) -> B256 {
        self.header.hash()
    }

    /// Returns the RLP-encoded length of the full block.
    ///
    /// This is the single byte-accounting rule used for batch-size decisions
    /// throughout the storage pipeline.
    pub fn encoded_size(&self) -> usize {
        self.length()
    }

    /// RLP-encodes the full block.
    pub fn encoded(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.length());
        self.encode(&mut out);
        out
    }

    /// Decodes a block from RLP bytes.
    pub fn decode(mut bytes: &[u8]) -> Result<Self, alloy_rlp::Error> {
        <Self as alloy_rlp::Decodable>::decode(&mut bytes)
    }
}
