use clap::Parser;
use eyre::Result;
use sygma_client::{ChainEvent, EventFilter, follow_events};

use super::common::{Chain, CommonArgs, connect};

#[derive(Parser, Debug)]
pub(crate) struct EventsArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Chain to follow
    #[arg(long, value_enum, default_value = "pallet")]
    chain: Chain,

    /// Only show events of pallets starting with this prefix
    #[arg(long, default_value = "sygma", conflicts_with = "all")]
    prefix: String,

    /// Show events of every pallet
    #[arg(long)]
    all: bool,

    /// Stop after this many events
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print one JSON object per event
    #[arg(long)]
    json: bool,
}

impl EventsArgs {
    fn filter(&self) -> EventFilter {
        if self.all { EventFilter::all() } else { EventFilter::pallet_prefix(&self.prefix) }
    }

    pub(crate) async fn run(self) -> Result<()> {
        let config = self.common.load_config()?;
        let client = connect(&config, self.chain.into()).await?;
        let confirmation = config.submit.confirmation;
        let filter = self.filter();
        let json = self.json;

        let print = |event: &ChainEvent| {
            if json {
                let line = serde_json::json!({
                    "block": format!("{:?}", event.block_hash),
                    "pallet": event.pallet,
                    "variant": event.variant,
                    "fields": event.fields,
                });
                println!("{line}");
            } else {
                println!("[{:?}] {event}", event.block_hash);
            }
        };
        let follow = follow_events(&**client.backend(), confirmation, &filter, self.limit, print);

        tokio::select! {
            seen = follow => {
                let seen = seen?;
                eprintln!("{seen} event(s)");
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted");
            }
        }
        Ok(())
    }
}
