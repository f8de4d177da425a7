use clap::Parser;
use eyre::Result;
use sygma_e2e::{ChainRole, ExecuteProposalScenario, ScenarioRunner};

use super::common::{CommonArgs, connect, finish, policy};

#[derive(Parser, Debug)]
pub(crate) struct ExecuteProposalArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Asset id of USDC on the pallet node (overrides config)
    #[arg(long)]
    asset_id: Option<u32>,

    /// Stop at the first failing scenario
    #[arg(long)]
    fail_fast: bool,
}

impl ExecuteProposalArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let mut config = self.common.load_config()?;
        if let Some(asset_id) = self.asset_id {
            config.proposal.usdc_asset_id = asset_id;
        }

        let client = connect(&config, ChainRole::Pallet).await?;
        let scenario = ExecuteProposalScenario::new(
            client,
            config.signer()?,
            config.mpc_address,
            config.proposal.clone(),
        )?;

        let report = ScenarioRunner::new(policy(self.fail_fast)).add(scenario).run().await;
        finish("Proposal execution", &report)
    }
}
