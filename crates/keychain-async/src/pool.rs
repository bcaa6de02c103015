use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use keychain_core::{KeyChainClient, KeyChainError};
use thiserror::Error;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::warn;

/// Failure of a [`PoolTask`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The client call itself failed; the error is passed through untouched.
    #[error(transparent)]
    KeyChain(#[from] KeyChainError),
    /// The runtime shut down before the call could run.
    #[error("thread pool is shut down")]
    Shutdown,
    /// The call panicked on the worker thread.
    #[error("task panicked on the thread pool")]
    Panicked,
}

/// Handle to a client call running on tokio's blocking pool.
#[derive(Debug)]
pub struct PoolTask<T> {
    inner: JoinHandle<Result<T, KeyChainError>>,
}

impl<T> Future for PoolTask<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
            Ok(result) => result.map_err(PoolError::from),
            Err(err) if err.is_panic() => {
                warn!("pooled keychain call panicked");
                Err(PoolError::Panicked)
            }
            Err(_) => Err(PoolError::Shutdown),
        })
    }
}

/// Client whose calls are offloaded to the blocking pool of `handle`'s
/// runtime.
#[derive(Debug, Clone)]
pub struct PooledClient {
    client: KeyChainClient,
    handle: Handle,
}

impl PooledClient {
    pub fn new(client: KeyChainClient, handle: Handle) -> Self {
        Self { client, handle }
    }

    /// Use the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Outside a tokio runtime, like [`Handle::current`].
    pub fn current(client: KeyChainClient) -> Self {
        Self::new(client, Handle::current())
    }

    pub fn client(&self) -> &KeyChainClient {
        &self.client
    }

    pub fn exists(&self, key: &str) -> PoolTask<bool> {
        let key = key.to_owned();
        self.run(move |client| Ok(client.exists(&key)))
    }

    pub fn get(&self, key: &str) -> PoolTask<Vec<u8>> {
        let key = key.to_owned();
        self.run(move |client| client.get(&key))
    }

    pub fn put(&self, key: &str, data: &[u8]) -> PoolTask<()> {
        let (key, data) = (key.to_owned(), data.to_vec());
        self.run(move |client| {
            client.put(&key, &data);
            Ok(())
        })
    }

    pub fn put_system(&self, key: &str, data: &[u8]) -> PoolTask<()> {
        let (key, data) = (key.to_owned(), data.to_vec());
        self.run(move |client| {
            client.put_system(&key, &data);
            Ok(())
        })
    }

    fn run<T, Op>(&self, op: Op) -> PoolTask<T>
    where
        T: Send + 'static,
        Op: FnOnce(&KeyChainClient) -> Result<T, KeyChainError> + Send + 'static,
    {
        let client = self.client.clone();
        PoolTask {
            inner: self.handle.spawn_blocking(move || op(&client)),
        }
    }
}

#[cfg(test)]
mod tests {
    use keychain_core::{EncryptionSettings, FnBackend, ItemMode};

    use super::*;

    fn exploding_client() -> KeyChainClient {
        let backend = FnBackend::new(
            |_: &str| panic!("backend exploded"),
            |_: &str| Err(KeyChainError::NotFound),
            |_: &str, _: &[u8], _: ItemMode| {},
        );
        KeyChainClient::new(backend, EncryptionSettings::live())
    }

    #[tokio::test]
    async fn backend_errors_keep_their_identity() {
        let pooled = PooledClient::current(exploding_client());
        assert_eq!(
            pooled.get("none").await,
            Err(PoolError::KeyChain(KeyChainError::NotFound))
        );
    }

    #[tokio::test]
    async fn panics_surface_as_pool_errors() {
        let pooled = PooledClient::current(exploding_client());
        assert_eq!(pooled.exists("k").await, Err(PoolError::Panicked));
    }

    #[test]
    fn shut_down_runtime_reports_shutdown() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .expect("runtime");
        let handle = runtime.handle().clone();
        runtime.shutdown_background();

        let pooled = PooledClient::new(exploding_client(), handle);
        let task = pooled.put("k", b"v");

        let waiter = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        assert_eq!(waiter.block_on(task), Err(PoolError::Shutdown));
    }
}
