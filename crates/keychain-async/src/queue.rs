use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use keychain_core::{KeyChainClient, KeyChainError};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

/// Unit of work handed to an [`ExecutionQueue`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs jobs off the caller's thread.
pub trait ExecutionQueue: Send + Sync {
    fn dispatch(&self, job: Job);
}

impl<Q: ExecutionQueue + ?Sized> ExecutionQueue for Arc<Q> {
    fn dispatch(&self, job: Job) {
        (**self).dispatch(job)
    }
}

/// Jobs run on tokio's blocking pool; no ordering between jobs.
impl ExecutionQueue for tokio::runtime::Handle {
    fn dispatch(&self, job: Job) {
        drop(self.spawn_blocking(job));
    }
}

/// FIFO queue drained by one dedicated worker thread.
///
/// A job that panics is logged and skipped; the worker moves on to the next
/// job. Dropping the queue lets already-dispatched jobs finish, then joins
/// the worker.
pub struct SerialQueue {
    label: String,
    sender: Option<UnboundedSender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl SerialQueue {
    pub fn new(label: impl Into<String>) -> io::Result<Self> {
        let label = label.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let worker = thread::Builder::new()
            .name(label.clone())
            .spawn({
                let label = label.clone();
                move || {
                    while let Some(job) = receiver.blocking_recv() {
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                            warn!(%label, "job panicked: {}", panic_message(&*payload));
                        }
                    }
                }
            })?;
        debug!(%label, "serial queue started");

        Ok(Self {
            label,
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl ExecutionQueue for SerialQueue {
    fn dispatch(&self, job: Job) {
        let sent = self.sender.as_ref().map(|sender| sender.send(job));
        if !matches!(sent, Some(Ok(()))) {
            warn!(label = %self.label, "queue stopped, job dropped");
        }
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            // A job holding the last reference would otherwise join itself.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                warn!(label = %self.label, "serial queue worker panicked");
            }
        }
    }
}

/// Client whose calls run on `queue` and report through callbacks.
///
/// Callbacks fire on the queue, after the underlying call returns. A call
/// that panics (a structurally corrupt envelope, a fatal keyring failure)
/// never fires its callback.
#[derive(Debug, Clone)]
pub struct CallbackClient<Q> {
    client: KeyChainClient,
    queue: Q,
}

impl<Q: ExecutionQueue> CallbackClient<Q> {
    pub fn new(client: KeyChainClient, queue: Q) -> Self {
        Self { client, queue }
    }

    pub fn client(&self) -> &KeyChainClient {
        &self.client
    }

    pub fn exists<F>(&self, key: &str, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let key = key.to_owned();
        self.schedule(move |client| client.exists(&key), callback);
    }

    pub fn get<F>(&self, key: &str, callback: F)
    where
        F: FnOnce(Result<Vec<u8>, KeyChainError>) + Send + 'static,
    {
        let key = key.to_owned();
        self.schedule(move |client| client.get(&key), callback);
    }

    pub fn put<F>(&self, key: &str, data: &[u8], callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let (key, data) = (key.to_owned(), data.to_vec());
        self.schedule(move |client| client.put(&key, &data), |()| callback());
    }

    pub fn put_system<F>(&self, key: &str, data: &[u8], callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let (key, data) = (key.to_owned(), data.to_vec());
        self.schedule(move |client| client.put_system(&key, &data), |()| callback());
    }

    fn schedule<T, Op, F>(&self, op: Op, callback: F)
    where
        Op: FnOnce(&KeyChainClient) -> T + Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let client = self.client.clone();
        self.queue.dispatch(Box::new(move || callback(op(&client))));
    }
}
