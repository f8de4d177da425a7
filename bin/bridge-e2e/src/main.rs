use clap::Parser;
use opts::{E2eCli, E2eSubcommand};

mod cmd;
mod opts;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = E2eCli::parse();

    match args.cmd {
        E2eSubcommand::Setup(cmd) => cmd.run().await,
        E2eSubcommand::ExecuteProposal(cmd) => cmd.run().await,
        E2eSubcommand::XcmE2e(cmd) => cmd.run().await,
        E2eSubcommand::Status(cmd) => cmd.run().await,
        E2eSubcommand::Pause(cmd) => cmd.run(true).await,
        E2eSubcommand::Unpause(cmd) => cmd.run(false).await,
        E2eSubcommand::Retry(cmd) => cmd.run().await,
        E2eSubcommand::UnregisterDomain(cmd) => cmd.run().await,
        E2eSubcommand::Events(cmd) => cmd.run().await,
    }
}
