pub mod memory;

pub use memory::{MemoryLockManager, MemoryStore, MemoryTxn};
