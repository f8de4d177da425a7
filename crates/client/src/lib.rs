//! Client side of the Sygma pallet harness.
//!
//! The node is a black box reached through three operations: submit an
//! extrinsic and await its inclusion, read storage, and follow events. They
//! are expressed by [`ChainBackend`], implemented over a live node by
//! [`SubxtBackend`].

pub mod backend;
pub mod client;
pub mod error;
pub mod events;
pub mod metrics;
pub mod query;
pub mod retry;
pub mod submitter;
pub mod subxt_backend;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use backend::{
    BlockRef, ChainBackend, ChainEvent, Confirmation, EventWatch, StorageQuery, TxStatus, TxWatch,
};
pub use client::ChainClient;
pub use error::ClientError;
pub use events::{EventFilter, follow_events, watch_events};
pub use query::{AccountInfo, AssetAccount, StateQuery};
pub use submitter::{NonceTracker, Receipt, SubmitOptions, Submitter};
pub use subxt_backend::{ChainInfo, SubxtBackend};

pub use subxt_signer::sr25519::Keypair;
