use clap::{Args, Parser};
use eyre::Result;
use sygma_client::ChainClient;
use sygma_primitives::{AdminOrigin, DomainId, RuntimeCall};

use super::common::{Chain, CommonArgs, connect};

/// Where and how an admin call is submitted.
#[derive(Args, Debug)]
pub(crate) struct AdminTarget {
    #[command(flatten)]
    common: CommonArgs,

    /// Chain hosting the bridge pallet
    #[arg(long, value_enum, default_value = "pallet")]
    chain: Chain,

    /// Submit without wrapping in `Sudo` (parachain runtimes)
    #[arg(long)]
    signed: bool,
}

impl AdminTarget {
    fn origin(&self) -> AdminOrigin {
        if self.signed { AdminOrigin::Signed } else { AdminOrigin::Sudo }
    }

    async fn submit(&self, call: RuntimeCall) -> Result<ChainClient> {
        let config = self.common.load_config()?;
        let signer = config.signer()?;
        let client = connect(&config, self.chain.into()).await?;

        let call = self.origin().wrap(call);
        println!("Submitting {call} to {}", client.name());
        let receipt = client.submit(&call, &signer).await?;
        println!("  Included in block {:?} ({})", receipt.block_hash, receipt.confirmation);
        println!("  Extrinsic:          {:?}", receipt.extrinsic_hash);
        Ok(client)
    }
}

#[derive(Parser, Debug)]
pub(crate) struct RetryArgs {
    #[command(flatten)]
    target: AdminTarget,

    /// Source block height holding the deposits to re-emit
    #[arg(long)]
    block_height: u128,

    /// Destination domain of the deposits
    #[arg(long)]
    domain: u8,
}

impl RetryArgs {
    fn call(&self) -> RuntimeCall {
        RuntimeCall::Retry {
            deposit_on_block_height: self.block_height,
            dest_domain: DomainId(self.domain),
        }
    }

    pub(crate) async fn run(self) -> Result<()> {
        self.target.submit(self.call()).await?;
        Ok(())
    }
}

#[derive(Parser, Debug)]
pub(crate) struct UnregisterDomainArgs {
    #[command(flatten)]
    target: AdminTarget,

    /// Domain to remove
    #[arg(long)]
    domain: u8,

    /// EVM chain id the domain was registered with
    #[arg(long)]
    chain_id: u64,
}

impl UnregisterDomainArgs {
    fn call(&self) -> RuntimeCall {
        RuntimeCall::UnregisterDomain { domain: DomainId(self.domain), chain_id: self.chain_id }
    }

    pub(crate) async fn run(self) -> Result<()> {
        let domain = DomainId(self.domain);
        let client = self.target.submit(self.call()).await?;
        let registered = client.query().is_domain_registered(domain).await?;
        println!("  Domain {domain} is {}", if registered { "still registered" } else { "gone" });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct RetryCli {
        #[command(flatten)]
        args: RetryArgs,
    }

    #[derive(Parser)]
    struct UnregisterCli {
        #[command(flatten)]
        args: UnregisterDomainArgs,
    }

    #[test]
    fn retry_targets_block_and_domain() {
        let cli = RetryCli::parse_from(["sygma-e2e", "--block-height", "42", "--domain", "1"]);
        assert_eq!(
            cli.args.call(),
            RuntimeCall::Retry { deposit_on_block_height: 42, dest_domain: DomainId(1) }
        );
        assert_eq!(cli.args.target.origin(), AdminOrigin::Sudo);
        assert_eq!(cli.args.target.chain, Chain::Pallet);
    }

    #[test]
    fn retry_requires_block_height() {
        assert!(RetryCli::try_parse_from(["sygma-e2e", "--domain", "1"]).is_err());
    }

    #[test]
    fn unregister_on_bridge_hub_is_signed() {
        let cli = UnregisterCli::parse_from([
            "sygma-e2e",
            "--domain",
            "2",
            "--chain-id",
            "1337",
            "--chain",
            "bridge-hub",
            "--signed",
        ]);
        let call = cli.args.target.origin().wrap(cli.args.call());
        assert_eq!(call, RuntimeCall::UnregisterDomain { domain: DomainId(2), chain_id: 1337 });
        assert_eq!(cli.args.target.chain, Chain::BridgeHub);
    }

    #[test]
    fn unregister_under_sudo_is_wrapped() {
        let cli = UnregisterCli::parse_from(["sygma-e2e", "--domain", "2", "--chain-id", "1337"]);
        let call = cli.args.target.origin().wrap(cli.args.call());
        assert!(matches!(call, RuntimeCall::Sudo(_)));
        assert_eq!(call.inner().name(), "unregister_domain");
    }
}
