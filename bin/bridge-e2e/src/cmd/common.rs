use std::path::PathBuf;

use clap::{Args, ValueEnum};
use eyre::{Result, WrapErr};
use sygma_client::{ChainClient, Confirmation};
use sygma_e2e::{ChainRole, Chains, E2eConfig, FailurePolicy, RunReport};
use sygma_primitives::MpcAddress;

/// Config file and environment overrides shared by every command.
#[derive(Args, Debug, Clone)]
pub(crate) struct CommonArgs {
    /// Path to harness config file
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Standalone pallet node endpoint (overrides config)
    #[arg(long, env = "PALLETWSENDPOINT")]
    pub(crate) pallet_endpoint: Option<String>,

    /// Relay chain endpoint (overrides config)
    #[arg(long, env = "RELAYCHAINENDPOINT")]
    pub(crate) relay_chain_endpoint: Option<String>,

    /// Asset hub endpoint (overrides config)
    #[arg(long, env = "ASSETHUBENDPOINT")]
    pub(crate) asset_hub_endpoint: Option<String>,

    /// Bridge hub endpoint (overrides config)
    #[arg(long, env = "BRIDGEHUBENDPOINT")]
    pub(crate) bridge_hub_endpoint: Option<String>,

    /// MPC address registered by setup and expected by proposals
    #[arg(long, env = "MPCADDR")]
    pub(crate) mpc_address: Option<MpcAddress>,

    /// Secret URI of the admin signer
    #[arg(long, env = "SUDO_URI", hide_env_values = true)]
    pub(crate) sudo_uri: Option<String>,

    /// Resolve submissions at block inclusion instead of finality
    #[arg(long)]
    pub(crate) in_block: bool,

    /// Give up on a submission after this many seconds
    #[arg(long)]
    pub(crate) timeout_secs: Option<u64>,
}

impl CommonArgs {
    pub(crate) fn load_config(&self) -> Result<E2eConfig> {
        let mut config = if let Some(config_path) = &self.config {
            E2eConfig::load(config_path)
                .wrap_err_with(|| format!("loading {}", config_path.display()))?
        } else {
            E2eConfig::default_local()
        };

        let endpoints = &mut config.endpoints;
        if let Some(url) = &self.pallet_endpoint {
            endpoints.pallet = url.clone();
        }
        if let Some(url) = &self.relay_chain_endpoint {
            endpoints.relay_chain = Some(url.clone());
        }
        if let Some(url) = &self.asset_hub_endpoint {
            endpoints.asset_hub = url.clone();
        }
        if let Some(url) = &self.bridge_hub_endpoint {
            endpoints.bridge_hub = url.clone();
        }
        if let Some(address) = self.mpc_address {
            config.mpc_address = Some(address);
        }
        if let Some(uri) = &self.sudo_uri {
            config.sudo_uri = uri.clone();
        }
        if self.in_block {
            config.submit.confirmation = Confirmation::InBlock;
        }
        if let Some(secs) = self.timeout_secs {
            config.submit.timeout_secs = Some(secs);
        }
        Ok(config)
    }
}

/// A chain selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chain {
    Pallet,
    RelayChain,
    AssetHub,
    BridgeHub,
}

impl From<Chain> for ChainRole {
    fn from(chain: Chain) -> Self {
        match chain {
            Chain::Pallet => Self::Pallet,
            Chain::RelayChain => Self::RelayChain,
            Chain::AssetHub => Self::AssetHub,
            Chain::BridgeHub => Self::BridgeHub,
        }
    }
}

pub(crate) async fn connect(config: &E2eConfig, role: ChainRole) -> Result<ChainClient> {
    let url = role
        .endpoint(&config.endpoints)
        .ok_or_else(|| eyre::eyre!("no endpoint configured for {role}"))?;
    ChainClient::connect(role.as_str(), url, config.submit_options())
        .await
        .wrap_err_with(|| format!("connecting to {role} at {url}"))
}

pub(crate) async fn connect_all(config: &E2eConfig, roles: &[ChainRole]) -> Result<Chains> {
    Chains::connect(&config.endpoints, roles, config.submit_options())
        .await
        .wrap_err("connecting to chains")
}

pub(crate) fn policy(fail_fast: bool) -> FailurePolicy {
    if fail_fast { FailurePolicy::FailFast } else { FailurePolicy::CollectAll }
}

/// Prints the report and turns failures into a non-zero exit.
pub(crate) fn finish(title: &str, report: &RunReport) -> Result<()> {
    println!();
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    println!("{report}");

    if report.is_success() {
        println!("All scenarios passed");
        Ok(())
    } else {
        eyre::bail!("{} scenario(s) failed", report.failed().count() + report.skipped.len())
    }
}
