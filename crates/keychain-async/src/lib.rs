//! Delivery wrappers over [`keychain_core::KeyChainClient`].
//!
//! Each wrapper re-exposes `exists`, `get`, `put` and `put_system` and
//! forwards to the synchronous client unchanged; only the way results are
//! handed back differs.
//!
//! - [`CallbackClient`]: runs on an [`ExecutionQueue`] and invokes a callback.
//! - [`DeferredClient`]: returns a cold [`Deferred`] future.
//! - [`PooledClient`]: runs on tokio's blocking pool and returns a [`PoolTask`].

pub mod deferred;
pub mod pool;
pub mod queue;

pub use deferred::{Deferred, DeferredClient};
pub use pool::{PoolError, PoolTask, PooledClient};
pub use queue::{CallbackClient, ExecutionQueue, Job, SerialQueue};
