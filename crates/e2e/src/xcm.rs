//! XCM deposit scenarios on the bridge hub and asset hub.

use async_trait::async_trait;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;
use sygma_client::{ChainClient, Receipt};
use sygma_primitives::{
    Balance, RuntimeCall,
    xcm::{AssetId, MultiAsset, MultiLocation},
};
use tracing::info;

use crate::{
    ScenarioError,
    balance::{BalanceProbe, Check, Expectation, verify},
    config::{ConfigError, E2eConfig, FeeConfig, ReserveAccounts},
    scenario::Scenario,
};

const SENDER: &str = "sender";
const RESERVE: &str = "transfer reserve";
const FEE_RESERVE: &str = "fee reserve";

/// Everything a deposit needs, resolved from configuration once.
#[derive(Clone)]
pub struct Deposit {
    client: ChainClient,
    signer: Keypair,
    amount: Balance,
    dest: MultiLocation,
    accounts: ReserveAccounts,
    fees: FeeConfig,
}

impl Deposit {
    pub fn new(
        client: ChainClient,
        signer: Keypair,
        config: &E2eConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            signer,
            amount: config.xcm.deposit_amount,
            dest: config.xcm.destination()?,
            accounts: config.accounts.clone(),
            fees: config.fees,
        })
    }

    fn sender(&self) -> AccountId32 {
        self.signer.public_key().to_account_id()
    }

    fn fee(&self) -> Result<Balance, ConfigError> {
        self.fees.fee_for(self.amount).ok_or_else(|| {
            ConfigError::Invalid(format!("no local fee for {}", self.fees.handler.as_str()))
        })
    }

    async fn submit(&self, asset: AssetId) -> Result<Receipt, ScenarioError> {
        let amount = self.amount.to_u128().ok_or_else(|| {
            ConfigError::Invalid(format!("deposit amount {} does not fit u128", self.amount))
        })?;
        let call = RuntimeCall::Deposit {
            asset: MultiAsset::fungible(asset, amount),
            dest: self.dest.clone(),
        };
        let receipt = self.client.submit(&call, &self.signer).await?;
        info!(chain = self.client.name(), block = ?receipt.block_hash, %amount, "Deposit included");
        Ok(receipt)
    }
}

/// Native token deposit. The sender also pays the transaction fee, so only a
/// lower bound on its loss is known.
pub struct NativeDepositScenario {
    deposit: Deposit,
}

impl NativeDepositScenario {
    pub fn new(deposit: Deposit) -> Self {
        Self { deposit }
    }
}

#[async_trait]
impl Scenario for NativeDepositScenario {
    fn name(&self) -> &str {
        "bridge-hub native deposit"
    }

    async fn run(&self) -> Result<(), ScenarioError> {
        let d = &self.deposit;
        let probe = BalanceProbe::new(d.client.query().clone())
            .native(SENDER, &d.sender())
            .native(RESERVE, &d.accounts.native_reserve)
            .native(FEE_RESERVE, &d.accounts.fee_reserve);

        let fee = d.fee()?;
        let before = probe.snapshot().await?;
        d.submit(AssetId::native()).await?;
        let after = probe.snapshot().await?;

        ScenarioError::check(verify(
            &before,
            &after,
            &[
                Check::new(SENDER, Expectation::DecreasedMoreThan(d.amount)),
                Check::new(RESERVE, Expectation::Increased(d.amount.saturating_sub(fee))),
                Check::new(FEE_RESERVE, Expectation::Increased(fee)),
            ],
        ))
    }
}

/// Foreign asset deposit. Transaction fees are paid in the native token, so
/// the asset balances move by exact amounts.
pub struct AssetDepositScenario {
    deposit: Deposit,
    asset_id: u32,
    location: MultiLocation,
}

impl AssetDepositScenario {
    pub fn new(deposit: Deposit, asset_id: u32, location: MultiLocation) -> Self {
        Self { deposit, asset_id, location }
    }

    /// The bridge hub USDC deposit described by `config`.
    pub fn usdc(deposit: Deposit, config: &E2eConfig) -> Result<Self, ConfigError> {
        let usdc = &config.bridge_hub.usdc;
        Ok(Self::new(deposit, usdc.id, usdc.location(config.bridge_hub.para_id)?))
    }
}

#[async_trait]
impl Scenario for AssetDepositScenario {
    fn name(&self) -> &str {
        "bridge-hub asset deposit"
    }

    async fn run(&self) -> Result<(), ScenarioError> {
        let d = &self.deposit;
        let probe = BalanceProbe::new(d.client.query().clone())
            .asset(SENDER, self.asset_id, &d.sender())
            .asset(RESERVE, self.asset_id, &d.accounts.other_reserve)
            .asset(FEE_RESERVE, self.asset_id, &d.accounts.fee_reserve);

        let fee = d.fee()?;
        let before = probe.snapshot().await?;
        d.submit(self.location.clone().into()).await?;
        let after = probe.snapshot().await?;

        ScenarioError::check(verify(
            &before,
            &after,
            &[
                Check::new(SENDER, Expectation::Decreased(d.amount)),
                Check::new(RESERVE, Expectation::Increased(d.amount.saturating_sub(fee))),
                Check::new(FEE_RESERVE, Expectation::Increased(fee)),
            ],
        ))
    }
}

/// Native deposit from the asset hub. Its effects land on another chain, so
/// only acceptance of the extrinsic is checked.
pub struct AssetHubDepositScenario {
    deposit: Deposit,
}

impl AssetHubDepositScenario {
    pub fn new(deposit: Deposit) -> Self {
        Self { deposit }
    }
}

#[async_trait]
impl Scenario for AssetHubDepositScenario {
    fn name(&self) -> &str {
        "asset-hub native deposit"
    }

    async fn run(&self) -> Result<(), ScenarioError> {
        self.deposit.submit(AssetId::native()).await.map(|_| ())
    }
}
