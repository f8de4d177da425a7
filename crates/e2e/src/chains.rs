//! The set of nodes a run talks to.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use sygma_client::{ChainClient, ClientError, SubmitOptions};
use tracing::info;

use crate::{ScenarioError, config::Endpoints};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainRole {
    /// Standalone node with the sygma pallets.
    Pallet,
    RelayChain,
    AssetHub,
    BridgeHub,
}

impl ChainRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pallet => "pallet",
            Self::RelayChain => "relay-chain",
            Self::AssetHub => "asset-hub",
            Self::BridgeHub => "bridge-hub",
        }
    }

    pub fn endpoint(self, endpoints: &Endpoints) -> Option<&str> {
        match self {
            Self::Pallet => Some(&endpoints.pallet),
            Self::RelayChain => endpoints.relay_chain.as_deref(),
            Self::AssetHub => Some(&endpoints.asset_hub),
            Self::BridgeHub => Some(&endpoints.bridge_hub),
        }
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connected clients keyed by role.
#[derive(Clone, Default)]
pub struct Chains {
    clients: BTreeMap<ChainRole, ChainClient>,
}

impl Chains {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: ChainRole, client: ChainClient) -> Self {
        self.clients.insert(role, client);
        self
    }

    /// Connects to every role in `roles` that has an endpoint.
    pub async fn connect(
        endpoints: &Endpoints,
        roles: &[ChainRole],
        options: SubmitOptions,
    ) -> Result<Self, ClientError> {
        let mut chains = Self::new();
        for role in roles {
            let Some(url) = role.endpoint(endpoints) else {
                continue;
            };
            info!(%role, %url, "Connecting");
            let client = ChainClient::connect(role.as_str(), url, options).await?;
            chains = chains.with(*role, client);
        }
        Ok(chains)
    }

    pub fn get(&self, role: ChainRole) -> Result<&ChainClient, ScenarioError> {
        self.clients.get(&role).ok_or(ScenarioError::NotConnected(role))
    }

    pub fn roles(&self) -> impl Iterator<Item = ChainRole> + '_ {
        self.clients.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use sygma_client::mock::MockBackend;

    #[test]
    fn relay_chain_endpoint_is_optional() {
        let mut endpoints = Endpoints::default();
        assert_eq!(ChainRole::RelayChain.endpoint(&endpoints), None);
        assert_eq!(ChainRole::Pallet.endpoint(&endpoints), Some("ws://127.0.0.1:9944"));

        endpoints.relay_chain = Some("ws://127.0.0.1:9942".into());
        assert_eq!(ChainRole::RelayChain.endpoint(&endpoints), Some("ws://127.0.0.1:9942"));
    }

    #[test]
    fn missing_role_is_an_error() {
        let client = ChainClient::new(
            "bridge-hub",
            Arc::new(MockBackend::new()),
            SubmitOptions::default(),
        );
        let chains = Chains::new().with(ChainRole::BridgeHub, client);

        assert!(chains.get(ChainRole::BridgeHub).is_ok());
        assert!(matches!(
            chains.get(ChainRole::AssetHub),
            Err(ScenarioError::NotConnected(ChainRole::AssetHub))
        ));
        assert_eq!(chains.roles().collect::<Vec<_>>(), [ChainRole::BridgeHub]);
    }
}
