//! The seam between the harness and a node.
//!
//! Everything above this module talks to [`ChainBackend`]; the RPC client
//! lives behind [`crate::SubxtBackend`] and tests use the scripted
//! `MockBackend`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use subxt::{
    dynamic::Value,
    utils::{AccountId32, H256},
};
use subxt_signer::sr25519::Keypair;
use sygma_primitives::RuntimeCall;

use crate::ClientError;

/// How deep a transaction must be before a submission resolves.
///
/// `InBlock < Finalized`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confirmation {
    InBlock,
    #[default]
    Finalized,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InBlock => f.write_str("in block"),
            Self::Finalized => f.write_str("finalized"),
        }
    }
}

/// Where a transaction landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRef {
    pub block_hash: H256,
    pub extrinsic_hash: H256,
}

/// Lifecycle of a submitted transaction as reported by the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Validated,
    Broadcast,
    InBlock(BlockRef),
    /// The block holding the transaction left the best chain.
    Retracted,
    Finalized(BlockRef),
    Dropped(String),
    Invalid(String),
    Error(String),
    /// Included, but the runtime returned an error from dispatch.
    DispatchFailed { block: H256, reason: String },
}

impl TxStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validated => "validated",
            Self::Broadcast => "broadcast",
            Self::InBlock(_) => "in_block",
            Self::Retracted => "retracted",
            Self::Finalized(_) => "finalized",
            Self::Dropped(_) => "dropped",
            Self::Invalid(_) => "invalid",
            Self::Error(_) => "error",
            Self::DispatchFailed { .. } => "dispatch_failed",
        }
    }

    /// The error this status represents, if it is a node-reported failure.
    pub fn rejection(&self) -> Option<ClientError> {
        match self {
            Self::Dropped(msg) => Some(ClientError::Dropped(msg.clone())),
            Self::Invalid(msg) => Some(ClientError::Invalid(msg.clone())),
            Self::Error(msg) => Some(ClientError::TxError(msg.clone())),
            Self::DispatchFailed { block, reason } => {
                Some(ClientError::DispatchFailed { block: *block, reason: reason.clone() })
            }
            _ => None,
        }
    }
}

/// A runtime event, decoded far enough to filter and print.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEvent {
    pub block_hash: H256,
    pub pallet: String,
    pub variant: String,
    pub fields: String,
}

impl fmt::Display for ChainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} {}", self.pallet, self.variant, self.fields)
    }
}

/// A storage entry address.
#[derive(Clone, Debug)]
pub struct StorageQuery {
    pub pallet: String,
    pub entry: String,
    pub keys: Vec<Value>,
}

impl StorageQuery {
    pub fn new(pallet: impl Into<String>, entry: impl Into<String>, keys: Vec<Value>) -> Self {
        Self { pallet: pallet.into(), entry: entry.into(), keys }
    }

    pub fn plain(pallet: impl Into<String>, entry: impl Into<String>) -> Self {
        Self::new(pallet, entry, Vec::new())
    }
}

impl fmt::Display for StorageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet, self.entry)
    }
}

/// Status updates for one submitted transaction.
#[async_trait]
pub trait TxWatch: Send {
    /// The next status, or `None` once the node closes the stream.
    async fn next_status(&mut self) -> Option<Result<TxStatus, ClientError>>;

    /// Releases the subscription. Consumes the watch so it can only happen once.
    fn unsubscribe(self: Box<Self>);
}

/// A feed of runtime events from best or finalized blocks.
#[async_trait]
pub trait EventWatch: Send {
    /// Events of the next block, or `None` once the feed ends.
    async fn next_events(&mut self) -> Option<Result<Vec<ChainEvent>, ClientError>>;

    fn unsubscribe(self: Box<Self>);
}

/// Everything the harness needs from a node.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    async fn account_nonce(&self, account: &AccountId32) -> Result<u64, ClientError>;

    /// Signs `call` with an explicit nonce and an immortal era, submits it and
    /// subscribes to its status.
    async fn submit_and_watch(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
        nonce: u64,
    ) -> Result<Box<dyn TxWatch>, ClientError>;

    /// Reads a storage entry at the latest block. `None` when unset.
    async fn fetch_storage(&self, query: &StorageQuery) -> Result<Option<Value>, ClientError>;

    async fn subscribe_events(
        &self,
        confirmation: Confirmation,
    ) -> Result<Box<dyn EventWatch>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_is_ordered() {
        assert!(Confirmation::InBlock < Confirmation::Finalized);
        assert_eq!(Confirmation::default(), Confirmation::Finalized);
    }

    #[test]
    fn only_failures_are_rejections() {
        let block = BlockRef { block_hash: H256::zero(), extrinsic_hash: H256::zero() };
        assert!(TxStatus::InBlock(block).rejection().is_none());
        assert!(TxStatus::Retracted.rejection().is_none());
        assert!(matches!(
            TxStatus::Invalid("bad nonce".into()).rejection(),
            Some(ClientError::Invalid(_))
        ));
        assert!(matches!(
            TxStatus::DispatchFailed { block: H256::zero(), reason: "BadOrigin".into() }
                .rejection(),
            Some(ClientError::DispatchFailed { .. })
        ));
    }
}
