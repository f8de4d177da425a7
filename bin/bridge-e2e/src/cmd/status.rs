use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use sygma_client::{StateQuery, SubxtBackend};
use sygma_e2e::{ChainRole, E2eConfig, config::DomainConfig};

use super::common::CommonArgs;

#[derive(Parser, Debug)]
pub(crate) struct StatusArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    format: String,
}

impl StatusArgs {
    pub(crate) async fn run(self) -> Result<()> {
        let config = self.common.load_config()?;
        let roles =
            [ChainRole::Pallet, ChainRole::RelayChain, ChainRole::AssetHub, ChainRole::BridgeHub];

        if self.format == "json" {
            let mut chains = serde_json::Map::new();
            for role in roles {
                chains.insert(role.to_string(), chain_json(&config, role).await);
            }
            println!("{}", serde_json::to_string_pretty(&chains)?);
            return Ok(());
        }

        println!("Sygma E2E Status");
        println!("================");
        println!();
        println!("Signer:        {}", config.signer()?.public_key().to_account_id());
        match config.mpc_address {
            Some(address) => println!("MPC address:   {address}"),
            None => println!("MPC address:   <not configured>"),
        }
        println!();

        for role in roles {
            print_chain(&config, role).await;
            println!();
        }
        Ok(())
    }
}

/// Domains the bridge pallet on `role` is expected to know about.
fn domains(config: &E2eConfig, role: ChainRole) -> &[DomainConfig] {
    match role {
        ChainRole::Pallet => &config.standalone.domains,
        ChainRole::BridgeHub => &config.bridge_hub.domains,
        ChainRole::RelayChain | ChainRole::AssetHub => &[],
    }
}

async fn print_chain(config: &E2eConfig, role: ChainRole) {
    let Some(url) = role.endpoint(&config.endpoints) else {
        println!("{role}: no endpoint configured");
        return;
    };
    println!("{role} ({url}):");

    let backend = match SubxtBackend::connect(url).await {
        Ok(backend) => backend,
        Err(e) => {
            println!("  Error connecting: {e}");
            return;
        }
    };
    match backend.chain_info().await {
        Ok(info) => {
            println!("  Best block:          {}", info.best_block);
            println!("  Spec version:        {}", info.spec_version);
            println!("  Genesis:             {:?}", info.genesis_hash);
        }
        Err(e) => println!("  Error reading chain info: {e}"),
    }

    let expected = domains(config, role);
    if expected.is_empty() {
        return;
    }

    let query = StateQuery::new(Arc::new(backend));
    match query.mpc_address().await {
        Ok(Some(address)) => println!("  Registered MPC:      {address}"),
        Ok(None) => println!("  Registered MPC:      <unset>"),
        Err(e) => println!("  Registered MPC:      error: {e}"),
    }
    for domain in expected {
        print!("  Domain {} (chain_id: {}): ", domain.id, domain.chain_id);
        let registered = query.is_domain_registered(domain.id).await;
        let paused = query.is_paused(domain.id).await;
        let deposits = query.deposit_count(domain.id).await;
        match (registered, paused, deposits) {
            (Ok(false), _, _) => println!("not registered"),
            (Ok(true), Ok(paused), Ok(deposits)) => println!(
                "{}, {deposits} deposits",
                if paused { "paused" } else { "active" }
            ),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => println!("error: {e}"),
        }
    }

    let accounts = &config.accounts;
    for (label, account) in [
        ("Fee reserve", &accounts.fee_reserve),
        ("Native reserve", &accounts.native_reserve),
        ("Other reserve", &accounts.other_reserve),
    ] {
        match query.free_balance(account).await {
            Ok(balance) => println!("  {label:<20} {balance}"),
            Err(e) => println!("  {label:<20} error: {e}"),
        }
    }
}

async fn chain_json(config: &E2eConfig, role: ChainRole) -> serde_json::Value {
    let Some(url) = role.endpoint(&config.endpoints) else {
        return serde_json::Value::Null;
    };
    let backend = match SubxtBackend::connect(url).await {
        Ok(backend) => backend,
        Err(e) => return serde_json::json!({ "url": url, "error": e.to_string() }),
    };
    let info = backend.chain_info().await;

    let query = StateQuery::new(Arc::new(backend));
    let mut domain_states = Vec::new();
    for domain in domains(config, role) {
        domain_states.push(serde_json::json!({
            "id": domain.id.0,
            "chain_id": domain.chain_id,
            "registered": query.is_domain_registered(domain.id).await.ok(),
            "paused": query.is_paused(domain.id).await.ok(),
            "deposits": query.deposit_count(domain.id).await.ok(),
        }));
    }

    serde_json::json!({
        "url": url,
        "best_block": info.as_ref().ok().map(|i| i.best_block),
        "spec_version": info.as_ref().ok().map(|i| i.spec_version),
        "domains": domain_states,
    })
}
