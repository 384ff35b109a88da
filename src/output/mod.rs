//! Canonical table output: batched CSV appends and size-based splitting.

mod split;
mod writer;

pub use split::split_by_size;
pub use writer::{StreamingWriter, WriteStats};
