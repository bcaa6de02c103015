use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use keychain_core::{KeyChainClient, KeyChainError};

/// Cold future: the wrapped call runs exactly once, on the first poll, on
/// the polling thread. Nothing happens until then.
pub struct Deferred<T> {
    op: Option<Box<dyn FnOnce() -> T + Send>>,
}

impl<T> Deferred<T> {
    pub fn new(op: impl FnOnce() -> T + Send + 'static) -> Self {
        Self {
            op: Some(Box::new(op)),
        }
    }

    /// Run the call on the current thread without an executor.
    pub fn run(mut self) -> T {
        self.take_op()()
    }

    fn take_op(&mut self) -> Box<dyn FnOnce() -> T + Send> {
        self.op
            .take()
            .unwrap_or_else(|| panic!("`Deferred` polled after completion"))
    }
}

impl<T> Future for Deferred<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<T> {
        Poll::Ready(self.take_op()())
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("pending", &self.op.is_some())
            .finish()
    }
}

/// Client whose calls come back as [`Deferred`] futures.
#[derive(Debug, Clone)]
pub struct DeferredClient {
    client: KeyChainClient,
}

impl DeferredClient {
    pub fn new(client: KeyChainClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &KeyChainClient {
        &self.client
    }

    pub fn exists(&self, key: &str) -> Deferred<bool> {
        let (client, key) = (self.client.clone(), key.to_owned());
        Deferred::new(move || client.exists(&key))
    }

    pub fn get(&self, key: &str) -> Deferred<Result<Vec<u8>, KeyChainError>> {
        let (client, key) = (self.client.clone(), key.to_owned());
        Deferred::new(move || client.get(&key))
    }

    pub fn put(&self, key: &str, data: &[u8]) -> Deferred<()> {
        let (client, key, data) = (self.client.clone(), key.to_owned(), data.to_vec());
        Deferred::new(move || client.put(&key, &data))
    }

    pub fn put_system(&self, key: &str, data: &[u8]) -> Deferred<()> {
        let (client, key, data) = (self.client.clone(), key.to_owned(), data.to_vec());
        Deferred::new(move || client.put_system(&key, &data))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn does_not_run_until_awaited() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let deferred = Deferred::new(move || counter.fetch_add(1, Ordering::SeqCst) + 1);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(format!("{deferred:?}"), "Deferred { pending: true }");

        assert_eq!(deferred.await, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_without_polling_never_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        drop(Deferred::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn run_executes_inline() {
        assert_eq!(Deferred::new(|| 41 + 1).run(), 42);
    }
}
