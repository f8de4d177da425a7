//! Runtime event feed.

use tracing::info;

use crate::{
    ClientError,
    backend::{ChainBackend, ChainEvent, Confirmation},
};

/// Selects events by pallet name prefix, case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub pallet_prefix: Option<String>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn pallet_prefix(prefix: impl Into<String>) -> Self {
        Self { pallet_prefix: Some(prefix.into()) }
    }

    /// Events of every `Sygma*` pallet.
    pub fn sygma() -> Self {
        Self::pallet_prefix("sygma")
    }

    pub fn matches(&self, event: &ChainEvent) -> bool {
        match &self.pallet_prefix {
            Some(prefix) => event.pallet.to_lowercase().starts_with(&prefix.to_lowercase()),
            None => true,
        }
    }
}

/// Streams matching events to `on_event` until `limit` of them were seen or
/// the feed ends. The subscription is released exactly once.
pub async fn follow_events<B, F>(
    backend: &B,
    confirmation: Confirmation,
    filter: &EventFilter,
    limit: Option<usize>,
    mut on_event: F,
) -> Result<usize, ClientError>
where
    B: ChainBackend + ?Sized,
    F: FnMut(&ChainEvent) + Send,
{
    let mut watch = backend.subscribe_events(confirmation).await?;
    info!(%confirmation, prefix = ?filter.pallet_prefix, "Subscribed to events");

    let mut seen = 0usize;
    let result = loop {
        if limit.is_some_and(|limit| seen >= limit) {
            break Ok(seen);
        }
        match watch.next_events().await {
            Some(Ok(events)) => {
                for event in events.iter().filter(|e| filter.matches(e)) {
                    if limit.is_some_and(|limit| seen >= limit) {
                        break;
                    }
                    on_event(event);
                    seen += 1;
                }
            }
            Some(Err(err)) => break Err(err),
            None => break Ok(seen),
        }
    };

    watch.unsubscribe();
    result
}

/// Collects up to `limit` matching events.
pub async fn watch_events<B>(
    backend: &B,
    confirmation: Confirmation,
    filter: &EventFilter,
    limit: usize,
) -> Result<Vec<ChainEvent>, ClientError>
where
    B: ChainBackend + ?Sized,
{
    let mut collected = Vec::new();
    follow_events(backend, confirmation, filter, Some(limit), |event| {
        collected.push(event.clone())
    })
    .await?;
    Ok(collected)
}
