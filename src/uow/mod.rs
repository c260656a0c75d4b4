pub mod executor;
pub mod lock;
pub mod store;

pub use executor::LockingExecutor;
pub use lock::{LockGuard, LockManager, LockName};
pub use store::{Store, TxnScope};
