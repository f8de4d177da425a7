//! Chain types and typed call builders for the Sygma substrate pallets.
//!
//! Every extrinsic the harness submits is a [`RuntimeCall`] variant with typed
//! fields. Calls are lowered to `(pallet, call, fields)` triples of dynamic
//! [`Value`]s right before submission, so field layouts are checked at compile
//! time rather than assembled from strings at the call site.

pub mod balance;
pub mod call;
pub mod error;
pub mod proposal;
pub mod types;
pub mod xcm;

pub use balance::Balance;
pub use call::{AdminOrigin, CallData, RuntimeCall};
pub use error::PrimitivesError;
pub use proposal::{Proposal, ProposalSignature, ResourceId};
pub use types::{DomainId, FeeHandlerType, MpcAddress};

pub use subxt::{
    dynamic::Value,
    utils::{AccountId32, H256},
};
