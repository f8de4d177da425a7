//! Typed runtime calls.
//!
//! Each variant carries exactly the arguments of one extrinsic. [`RuntimeCall::lower`]
//! turns it into positional dynamic values, which is the only place pallet
//! and call names appear as strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use subxt::{dynamic::Value, utils::AccountId32};

use crate::{
    DomainId, FeeHandlerType, MpcAddress, Proposal, ProposalSignature,
    xcm::{AssetId, MultiAsset, MultiLocation},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeCall {
    ForceSetBalance {
        who: AccountId32,
        free: u128,
    },
    TransferKeepAlive {
        dest: AccountId32,
        value: u128,
    },
    CreateAsset {
        id: u32,
        admin: AccountId32,
        min_balance: u128,
    },
    SetAssetMetadata {
        id: u32,
        name: String,
        symbol: String,
        decimals: u8,
    },
    MintAsset {
        id: u32,
        beneficiary: AccountId32,
        amount: u128,
    },
    RegisterDomain {
        domain: DomainId,
        chain_id: u64,
    },
    UnregisterDomain {
        domain: DomainId,
        chain_id: u64,
    },
    SetMpcAddress {
        address: MpcAddress,
    },
    PauseBridge {
        domain: DomainId,
    },
    UnpauseBridge {
        domain: DomainId,
    },
    PauseAllBridges,
    UnpauseAllBridges,
    Deposit {
        asset: MultiAsset,
        dest: MultiLocation,
    },
    Retry {
        deposit_on_block_height: u128,
        dest_domain: DomainId,
    },
    ExecuteProposal {
        proposals: Vec<Proposal>,
        signature: ProposalSignature,
    },
    SetFeeHandler {
        domain: DomainId,
        asset: AssetId,
        handler: FeeHandlerType,
    },
    SetFee {
        domain: DomainId,
        asset: AssetId,
        amount: u128,
    },
    SetFeeRate {
        domain: DomainId,
        asset: AssetId,
        /// Basis points, `500` is 5%.
        fee_rate: u32,
        lower_bound: u128,
        upper_bound: u128,
    },
    Sudo(Box<RuntimeCall>),
}

/// A call ready for `subxt::dynamic::tx`.
#[derive(Clone, Debug)]
pub struct CallData {
    pub pallet: &'static str,
    pub call: &'static str,
    pub fields: Vec<Value>,
}

impl RuntimeCall {
    pub fn pallet(&self) -> &'static str {
        match self {
            Self::ForceSetBalance { .. } | Self::TransferKeepAlive { .. } => "Balances",
            Self::CreateAsset { .. } | Self::SetAssetMetadata { .. } | Self::MintAsset { .. } => {
                "Assets"
            }
            Self::RegisterDomain { .. }
            | Self::UnregisterDomain { .. }
            | Self::SetMpcAddress { .. }
            | Self::PauseBridge { .. }
            | Self::UnpauseBridge { .. }
            | Self::PauseAllBridges
            | Self::UnpauseAllBridges
            | Self::Deposit { .. }
            | Self::Retry { .. }
            | Self::ExecuteProposal { .. } => "SygmaBridge",
            Self::SetFeeHandler { .. } => "SygmaFeeHandlerRouter",
            Self::SetFee { .. } => "SygmaBasicFeeHandler",
            Self::SetFeeRate { .. } => "SygmaPercentageFeeHandler",
            Self::Sudo(_) => "Sudo",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ForceSetBalance { .. } => "force_set_balance",
            Self::TransferKeepAlive { .. } => "transfer_keep_alive",
            Self::CreateAsset { .. } => "create",
            Self::SetAssetMetadata { .. } => "set_metadata",
            Self::MintAsset { .. } => "mint",
            Self::RegisterDomain { .. } => "register_domain",
            Self::UnregisterDomain { .. } => "unregister_domain",
            Self::SetMpcAddress { .. } => "set_mpc_address",
            Self::PauseBridge { .. } => "pause_bridge",
            Self::UnpauseBridge { .. } => "unpause_bridge",
            Self::PauseAllBridges => "pause_all_bridges",
            Self::UnpauseAllBridges => "unpause_all_bridges",
            Self::Deposit { .. } => "deposit",
            Self::Retry { .. } => "retry",
            Self::ExecuteProposal { .. } => "execute_proposal",
            Self::SetFeeHandler { .. } => "set_fee_handler",
            Self::SetFee { .. } => "set_fee",
            Self::SetFeeRate { .. } => "set_fee_rate",
            Self::Sudo(_) => "sudo",
        }
    }

    /// The innermost call, looking through any `Sudo` wrappers.
    pub fn inner(&self) -> &Self {
        match self {
            Self::Sudo(call) => call.inner(),
            other => other,
        }
    }

    /// Calls gated behind the bridge admin origin (root on standalone
    /// runtimes).
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::ForceSetBalance { .. }
                | Self::RegisterDomain { .. }
                | Self::UnregisterDomain { .. }
                | Self::SetMpcAddress { .. }
                | Self::PauseBridge { .. }
                | Self::UnpauseBridge { .. }
                | Self::PauseAllBridges
                | Self::UnpauseAllBridges
                | Self::Retry { .. }
                | Self::SetFeeHandler { .. }
                | Self::SetFee { .. }
                | Self::SetFeeRate { .. }
        )
    }

    pub fn lower(&self) -> CallData {
        CallData {
            pallet: self.pallet(),
            call: self.name(),
            fields: self.fields(),
        }
    }

    /// The call as a `RuntimeCall` enum value, used when nesting under `Sudo`.
    pub fn to_value(&self) -> Value {
        Value::unnamed_variant(
            self.pallet(),
            [Value::unnamed_variant(self.name(), self.fields())],
        )
    }

    fn fields(&self) -> Vec<Value> {
        match self {
            Self::ForceSetBalance { who, free } => vec![multi_address(who), Value::u128(*free)],
            Self::TransferKeepAlive { dest, value } => {
                vec![multi_address(dest), Value::u128(*value)]
            }
            Self::CreateAsset { id, admin, min_balance } => vec![
                Value::u128(*id as u128),
                multi_address(admin),
                Value::u128(*min_balance),
            ],
            Self::SetAssetMetadata { id, name, symbol, decimals } => vec![
                Value::u128(*id as u128),
                Value::from_bytes(name.as_bytes()),
                Value::from_bytes(symbol.as_bytes()),
                Value::u128(*decimals as u128),
            ],
            Self::MintAsset { id, beneficiary, amount } => vec![
                Value::u128(*id as u128),
                multi_address(beneficiary),
                Value::u128(*amount),
            ],
            Self::RegisterDomain { domain, chain_id }
            | Self::UnregisterDomain { domain, chain_id } => {
                vec![domain.to_value(), chain_id_value(*chain_id)]
            }
            Self::SetMpcAddress { address } => vec![address.to_value()],
            Self::PauseBridge { domain } | Self::UnpauseBridge { domain } => {
                vec![domain.to_value()]
            }
            Self::PauseAllBridges | Self::UnpauseAllBridges => Vec::new(),
            Self::Deposit { asset, dest } => vec![asset.to_value(), dest.to_value()],
            Self::Retry { deposit_on_block_height, dest_domain } => vec![
                Value::u128(*deposit_on_block_height),
                dest_domain.to_value(),
            ],
            Self::ExecuteProposal { proposals, signature } => vec![
                Value::unnamed_composite(proposals.iter().map(Proposal::to_value)),
                signature.to_value(),
            ],
            Self::SetFeeHandler { domain, asset, handler } => {
                vec![domain.to_value(), asset.to_value(), handler.to_value()]
            }
            Self::SetFee { domain, asset, amount } => {
                vec![domain.to_value(), asset.to_value(), Value::u128(*amount)]
            }
            Self::SetFeeRate { domain, asset, fee_rate, lower_bound, upper_bound } => vec![
                domain.to_value(),
                asset.to_value(),
                Value::u128(*fee_rate as u128),
                Value::u128(*lower_bound),
                Value::u128(*upper_bound),
            ],
            Self::Sudo(call) => vec![call.to_value()],
        }
    }
}

impl fmt::Display for RuntimeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sudo(call) => write!(f, "Sudo({call})"),
            _ => write!(f, "{}.{}", self.pallet(), self.name()),
        }
    }
}

fn multi_address(account: &AccountId32) -> Value {
    Value::unnamed_variant("Id", [Value::from_bytes(account.0)])
}

/// `sp_core::U256` is four little-endian `u64` limbs.
fn chain_id_value(chain_id: u64) -> Value {
    Value::unnamed_composite([Value::unnamed_composite([
        Value::u128(chain_id as u128),
        Value::u128(0),
        Value::u128(0),
        Value::u128(0),
    ])])
}

/// How admin calls reach the runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminOrigin {
    /// Wrap admin calls in `Sudo.sudo` (standalone runtimes).
    #[default]
    Sudo,
    /// Submit admin calls directly, relying on the signer's granted access
    /// (parachain runtimes).
    Signed,
}

impl AdminOrigin {
    pub fn wrap(self, call: RuntimeCall) -> RuntimeCall {
        match self {
            Self::Sudo if call.requires_admin() => RuntimeCall::Sudo(Box::new(call)),
            _ => call,
        }
    }
}
