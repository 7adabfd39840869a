//! Building blocks shared by the codec and the container.

pub mod bit_stream;
pub mod huff_tree;
pub mod ledger;
