//! Row synthesis: value shapes, parent key pools, and per-row generation.

pub mod key_pool;
pub mod synthesize;
pub mod value;
