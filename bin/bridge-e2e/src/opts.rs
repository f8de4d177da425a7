use crate::cmd::{
    admin::{RetryArgs, UnregisterDomainArgs},
    events::EventsArgs,
    execute_proposal::ExecuteProposalArgs,
    pause::PauseArgs,
    setup::SetupArgs,
    status::StatusArgs,
    xcm::XcmArgs,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sygma-e2e")]
#[command(version, about = "End-to-end harness for the Sygma substrate pallets", long_about = None)]
pub(crate) struct E2eCli {
    #[command(subcommand)]
    pub(crate) cmd: E2eSubcommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum E2eSubcommand {
    /// Register domains, fee handlers, assets and the MPC address
    Setup(SetupArgs),

    /// Execute the signed USDC and native proposals and check balances
    ExecuteProposal(ExecuteProposalArgs),

    /// Deposit from the bridge hub towards an EVM domain and check balances
    #[command(name = "xcm-e2e")]
    XcmE2e(XcmArgs),

    /// Show chain and bridge state on every configured endpoint
    Status(StatusArgs),

    /// Pause bridging to one or all domains
    Pause(PauseArgs),

    /// Unpause bridging to one or all domains
    Unpause(PauseArgs),

    /// Re-emit the deposits of a source block height
    Retry(RetryArgs),

    /// Remove a registered destination domain
    UnregisterDomain(UnregisterDomainArgs),

    /// Follow runtime events
    Events(EventsArgs),
}
