//! Chain setup plans.
//!
//! A plan is an ordered list of steps built entirely from [`E2eConfig`]. The
//! standalone and bridge-hub layouts differ only in which steps they emit and
//! how admin calls reach the runtime.

use std::fmt;

use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;
use sygma_primitives::{
    AdminOrigin, Balance, DomainId, FeeHandlerType, RuntimeCall, xcm::AssetId,
};
use tracing::{info, warn};

use crate::{
    ScenarioError,
    chains::{ChainRole, Chains},
    config::{AssetConfig, ConfigError, DomainConfig, E2eConfig, FeeConfig},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupAction {
    Submit(RuntimeCall),
    /// Reads the pause flag; setting the MPC address unpauses every domain.
    ExpectUnpaused(DomainId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupStep {
    pub chain: ChainRole,
    pub action: SetupAction,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            SetupAction::Submit(call) => write!(f, "[{}] {call}", self.chain),
            SetupAction::ExpectUnpaused(domain) => {
                write!(f, "[{}] check domain {domain} is unpaused", self.chain)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub submitted: usize,
    pub ready: Vec<DomainId>,
    pub paused: Vec<DomainId>,
}

impl SetupReport {
    pub fn is_ready(&self) -> bool {
        self.paused.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct SetupPlan {
    pub name: &'static str,
    pub origin: AdminOrigin,
    pub steps: Vec<SetupStep>,
}

impl SetupPlan {
    /// Standalone node: every admin call goes through `Sudo`.
    pub fn standalone(config: &E2eConfig, admin: &AccountId32) -> Result<Self, ConfigError> {
        let cfg = &config.standalone;
        let mut plan = PlanBuilder::new("standalone", AdminOrigin::Sudo, ChainRole::Pallet);

        plan.register_domains(&cfg.domains);
        plan.fee_handlers(&cfg.domains, &config.fees, &AssetId::native())?;

        for asset in &cfg.assets {
            plan.create_asset(asset, admin);
            plan.mint(asset.id, admin, asset.units(cfg.admin_mint))?;
            plan.mint(asset.id, &config.accounts.other_reserve, cfg.reserve_mint)?;
        }
        for asset in &cfg.assets {
            let location = asset.location(cfg.para_id)?.into();
            plan.fee_handlers(&cfg.domains, &config.fees, &location)?;
        }

        for reserve in reserves(config) {
            plan.submit(RuntimeCall::ForceSetBalance {
                who: reserve.clone(),
                free: amount(cfg.reserve_balance)?,
            });
        }

        if let Some(address) = config.mpc_address {
            plan.submit(RuntimeCall::SetMpcAddress { address });
            plan.expect_unpaused(&cfg.domains);
        }
        Ok(plan.build())
    }

    /// Asset hub plus bridge hub. The admin account holds granted access on
    /// the bridge hub, so calls are submitted without `Sudo`.
    pub fn bridge_hub(config: &E2eConfig, admin: &AccountId32) -> Result<Self, ConfigError> {
        let cfg = &config.bridge_hub;
        let usdc = &cfg.usdc;
        let mut plan = PlanBuilder::new("bridge-hub", AdminOrigin::Signed, ChainRole::AssetHub);

        for chain in [ChainRole::AssetHub, ChainRole::BridgeHub] {
            plan.chain = chain;
            plan.create_asset(usdc, admin);
            plan.mint(usdc.id, admin, usdc.units(cfg.admin_mint))?;
        }

        plan.register_domains(&cfg.domains);
        plan.fee_handlers(&cfg.domains, &config.fees, &AssetId::native())?;
        plan.fee_handlers(&cfg.domains, &config.fees, &usdc.location(cfg.para_id)?.into())?;

        for reserve in reserves(config) {
            plan.submit(RuntimeCall::TransferKeepAlive {
                dest: reserve.clone(),
                value: amount(cfg.reserve_balance)?,
            });
        }
        plan.mint(usdc.id, &config.accounts.other_reserve, cfg.reserve_mint)?;
        plan.mint(usdc.id, &config.accounts.fee_reserve, cfg.reserve_mint)?;

        if let Some(address) = config.mpc_address {
            plan.submit(RuntimeCall::SetMpcAddress { address });
            plan.expect_unpaused(&cfg.domains);
        }
        Ok(plan.build())
    }

    /// Runs every step in order. A rejected extrinsic aborts the plan; a
    /// domain left paused is only reported.
    pub async fn execute(
        &self,
        chains: &Chains,
        signer: &Keypair,
    ) -> Result<SetupReport, ScenarioError> {
        let mut report = SetupReport::default();
        info!(plan = self.name, steps = self.steps.len(), "Executing setup plan");

        for (index, step) in self.steps.iter().enumerate() {
            let client = chains.get(step.chain)?;
            match &step.action {
                SetupAction::Submit(call) => {
                    let receipt = client.submit(call, signer).await?;
                    info!(
                        step = index + 1,
                        chain = %step.chain,
                        %call,
                        block = ?receipt.block_hash,
                        "Setup step done"
                    );
                    report.submitted += 1;
                }
                SetupAction::ExpectUnpaused(domain) => {
                    if client.query().is_paused(*domain).await? {
                        warn!(chain = %step.chain, %domain, "Domain is still paused");
                        report.paused.push(*domain);
                    } else {
                        info!(chain = %step.chain, %domain, "Domain is ready");
                        report.ready.push(*domain);
                    }
                }
            }
        }
        Ok(report)
    }

    pub fn calls(&self) -> impl Iterator<Item = &RuntimeCall> {
        self.steps.iter().filter_map(|step| match &step.action {
            SetupAction::Submit(call) => Some(call),
            SetupAction::ExpectUnpaused(_) => None,
        })
    }
}

struct PlanBuilder {
    name: &'static str,
    origin: AdminOrigin,
    chain: ChainRole,
    steps: Vec<SetupStep>,
}

impl PlanBuilder {
    fn new(name: &'static str, origin: AdminOrigin, chain: ChainRole) -> Self {
        Self { name, origin, chain, steps: Vec::new() }
    }

    fn submit(&mut self, call: RuntimeCall) {
        self.steps.push(SetupStep {
            chain: self.chain,
            action: SetupAction::Submit(self.origin.wrap(call)),
        });
    }

    fn register_domains(&mut self, domains: &[DomainConfig]) {
        for domain in domains {
            let (domain, chain_id) = (domain.id, domain.chain_id);
            self.submit(RuntimeCall::RegisterDomain { domain, chain_id });
        }
    }

    /// Routes each domain's `asset` to the configured handler and sets that
    /// handler's fee.
    fn fee_handlers(
        &mut self,
        domains: &[DomainConfig],
        fees: &FeeConfig,
        asset: &AssetId,
    ) -> Result<(), ConfigError> {
        for domain in domains {
            self.submit(RuntimeCall::SetFeeHandler {
                domain: domain.id,
                asset: asset.clone(),
                handler: fees.handler,
            });
            let fee = match fees.handler {
                FeeHandlerType::BasicFeeHandler => RuntimeCall::SetFee {
                    domain: domain.id,
                    asset: asset.clone(),
                    amount: amount(fees.basic_fee)?,
                },
                FeeHandlerType::PercentageFeeHandler => RuntimeCall::SetFeeRate {
                    domain: domain.id,
                    asset: asset.clone(),
                    fee_rate: fees.rate,
                    lower_bound: amount(fees.lower_bound)?,
                    upper_bound: amount(fees.upper_bound)?,
                },
                FeeHandlerType::DynamicFeeHandler => {
                    return Err(ConfigError::Invalid(
                        "the dynamic fee handler cannot be configured by setup".into(),
                    ));
                }
            };
            self.submit(fee);
        }
        Ok(())
    }

    fn create_asset(&mut self, asset: &AssetConfig, admin: &AccountId32) {
        self.submit(RuntimeCall::CreateAsset {
            id: asset.id,
            admin: admin.clone(),
            min_balance: asset.min_balance,
        });
        self.submit(RuntimeCall::SetAssetMetadata {
            id: asset.id,
            name: asset.name.clone(),
            symbol: asset.symbol.clone(),
            decimals: asset.decimals,
        });
    }

    fn mint(
        &mut self,
        id: u32,
        beneficiary: &AccountId32,
        value: Balance,
    ) -> Result<(), ConfigError> {
        self.submit(RuntimeCall::MintAsset {
            id,
            beneficiary: beneficiary.clone(),
            amount: amount(value)?,
        });
        Ok(())
    }

    fn expect_unpaused(&mut self, domains: &[DomainConfig]) {
        for domain in domains {
            self.steps.push(SetupStep {
                chain: self.chain,
                action: SetupAction::ExpectUnpaused(domain.id),
            });
        }
    }

    fn build(self) -> SetupPlan {
        SetupPlan { name: self.name, origin: self.origin, steps: self.steps }
    }
}

fn reserves(config: &E2eConfig) -> [&AccountId32; 3] {
    let accounts = &config.accounts;
    [&accounts.fee_reserve, &accounts.native_reserve, &accounts.other_reserve]
}

fn amount(value: Balance) -> Result<u128, ConfigError> {
    value
        .to_u128()
        .ok_or_else(|| ConfigError::Invalid(format!("{value} does not fit a runtime balance")))
}
