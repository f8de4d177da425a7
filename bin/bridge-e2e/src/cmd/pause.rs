use clap::{ArgGroup, Parser};
use eyre::Result;
use sygma_primitives::{AdminOrigin, DomainId, RuntimeCall};

use super::common::{Chain, CommonArgs, connect};

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["domain", "all"])))]
pub(crate) struct PauseArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Destination domain to act on
    #[arg(long)]
    domain: Option<u8>,

    /// Act on every registered domain
    #[arg(long)]
    all: bool,

    /// Chain hosting the bridge pallet
    #[arg(long, value_enum, default_value = "pallet")]
    chain: Chain,

    /// Submit without wrapping in `Sudo` (parachain runtimes)
    #[arg(long)]
    signed: bool,
}

impl PauseArgs {
    fn call(&self, pause: bool) -> RuntimeCall {
        match (self.domain.map(DomainId), pause) {
            (Some(domain), true) => RuntimeCall::PauseBridge { domain },
            (Some(domain), false) => RuntimeCall::UnpauseBridge { domain },
            (None, true) => RuntimeCall::PauseAllBridges,
            (None, false) => RuntimeCall::UnpauseAllBridges,
        }
    }

    fn origin(&self) -> AdminOrigin {
        if self.signed { AdminOrigin::Signed } else { AdminOrigin::Sudo }
    }

    pub(crate) async fn run(self, pause: bool) -> Result<()> {
        let config = self.common.load_config()?;
        let signer = config.signer()?;
        let client = connect(&config, self.chain.into()).await?;

        let call = self.origin().wrap(self.call(pause));
        println!("Submitting {call} to {}", client.name());
        let receipt = client.submit(&call, &signer).await?;
        println!("  Included in block {:?} ({})", receipt.block_hash, receipt.confirmation);
        println!("  Extrinsic:          {:?}", receipt.extrinsic_hash);

        if let Some(domain) = self.domain.map(DomainId) {
            let paused = client.query().is_paused(domain).await?;
            println!("  Domain {domain} is now {}", if paused { "paused" } else { "active" });
        }
        Ok(())
    }
}
