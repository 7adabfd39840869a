//! # huffpack
//!
//! Static Huffman compression of byte buffers.
//!
//! * `symbols` tallies the input and holds the resulting code table
//! * `codec` encodes a buffer into a bit stream and decodes it back
//! * `container` persists code table and payload together in one file
//!
//! Tables, streams, and the transient Huffman tree are counted by `ledger`, so
//! callers can verify that every object they acquire is released exactly once.

mod tools;
pub mod symbols;
pub mod codec;
pub mod container;

pub use tools::bit_stream::{BitStream,Cursor};
pub use tools::ledger;

type DYNERR = Box<dyn std::error::Error>;

/// Codec Errors
#[derive(thiserror::Error,Debug,Clone,Copy,PartialEq,Eq)]
pub enum Error {
    #[error("nothing to compress")]
    EmptyInput,
    #[error("allocation failed")]
    AllocationFailure,
    #[error("bit stream is corrupted")]
    CorruptedStream,
    #[error("file type mismatch")]
    FileTypeMismatch,
    #[error("file was written on a platform with a different word width")]
    PlatformMismatch,
    #[error("symbol is missing from the code table")]
    SymbolMissing
}

/// How ties in frequency are broken while merging the tree
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum TieBreak {
    /// symbols keep the order in which they first appear in the input
    ScanOrder,
    /// symbols are put in ascending byte order before merging
    ByteValue
}

/// Longest code the decoder will accumulate before giving up
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum GuardBound {
    /// fixed at the 8 bit width of the alphabet, valid streams from deep trees are rejected
    ByteWidth,
    /// the longest code present in the table
    MaxCodeLength
}

/// Options controlling compression
#[derive(Clone,Copy,Debug)]
pub struct Options {
    /// tie-break order used when building the tree
    pub tie_break: TieBreak,
    /// bound used by the decoder to detect corruption
    pub guard: GuardBound,
    /// whether the encoder hands back the table in descending frequency order
    pub compact_table: bool
}

pub const STD_OPTIONS: Options = Options {
    tie_break: TieBreak::ScanOrder,
    guard: GuardBound::MaxCodeLength,
    compact_table: true
};
