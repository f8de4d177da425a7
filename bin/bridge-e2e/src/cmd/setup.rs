use clap::{Parser, ValueEnum};
use eyre::Result;
use sygma_e2e::{ChainRole, SetupPlan};

use super::common::{CommonArgs, connect_all};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// A single node running the sygma pallets with sudo
    Standalone,
    /// Asset hub and bridge hub parachains
    BridgeHub,
}

#[derive(Parser, Debug)]
pub(crate) struct SetupArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Network layout to prepare
    #[arg(long, value_enum, default_value = "standalone")]
    layout: Layout,

    /// Print the steps without submitting anything
    #[arg(long)]
    dry_run: bool,
}

impl SetupArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.common.load_config()?;
        let signer = config.signer()?;
        let admin = signer.public_key().to_account_id();

        let (plan, roles) = match self.layout {
            Layout::Standalone => {
                (SetupPlan::standalone(&config, &admin)?, vec![ChainRole::Pallet])
            }
            Layout::BridgeHub => (
                SetupPlan::bridge_hub(&config, &admin)?,
                vec![ChainRole::AssetHub, ChainRole::BridgeHub],
            ),
        };

        println!("Setup plan: {} ({} steps)", plan.name, plan.steps.len());
        println!("==========");
        if self.dry_run {
            for (index, step) in plan.steps.iter().enumerate() {
                println!("  {:>3}. {step}", index + 1);
            }
            return Ok(());
        }

        let chains = connect_all(&config, &roles).await?;
        let report = plan.execute(&chains, &signer).await?;

        println!();
        println!("Submitted extrinsics: {}", report.submitted);
        for domain in &report.ready {
            println!("  Domain {domain}: ready");
        }
        for domain in &report.paused {
            println!("  Domain {domain}: still paused");
        }

        if !report.is_ready() {
            eyre::bail!("{} domain(s) still paused after setup", report.paused.len());
        }
        println!("Sygma substrate pallet setup is done");
        Ok(())
    }
}
