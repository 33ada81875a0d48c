//! Test helpers shared across ctxlog crates.

pub mod fixture;
pub mod stores;

pub use fixture::{TestEngine, fixed_start};
pub use stores::{corrupt_copies, read_raw_store, write_raw_store};
