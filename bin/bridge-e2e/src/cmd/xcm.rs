use clap::Parser;
use eyre::Result;
use sygma_e2e::{
    AssetDepositScenario, AssetHubDepositScenario, ChainRole, Deposit, NativeDepositScenario,
    ScenarioRunner,
};

use super::common::{CommonArgs, connect, finish, policy};

#[derive(Parser, Debug)]
pub(crate) struct XcmArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Also submit a native deposit from the asset hub
    #[arg(long)]
    asset_hub: bool,

    /// Stop at the first failing scenario
    #[arg(long)]
    fail_fast: bool,
}

impl XcmArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let mut config = self.common.load_config()?;
        config.xcm.asset_hub_deposit |= self.asset_hub;
        let signer = config.signer()?;

        let bridge_hub = connect(&config, ChainRole::BridgeHub).await?;
        let deposit = Deposit::new(bridge_hub, signer.clone(), &config)?;

        let mut runner = ScenarioRunner::new(policy(self.fail_fast))
            .add(NativeDepositScenario::new(deposit.clone()))
            .add(AssetDepositScenario::usdc(deposit, &config)?);

        if config.xcm.asset_hub_deposit {
            let asset_hub = connect(&config, ChainRole::AssetHub).await?;
            let deposit = Deposit::new(asset_hub, signer, &config)?;
            runner = runner.add(AssetHubDepositScenario::new(deposit));
        }

        let report = runner.run().await;
        finish("XCM deposits", &report)
    }
}
