//! Storage contract and the client that wraps every backend in the
//! normalization and encryption layers.

mod backend;
mod client;

pub use backend::{FnBackend, ItemMode, KeyChainBackend};
pub use client::KeyChainClient;
