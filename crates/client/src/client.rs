use std::sync::Arc;

use subxt_signer::sr25519::Keypair;
use sygma_primitives::RuntimeCall;

use crate::{
    ClientError, Receipt, StateQuery, SubmitOptions, Submitter, SubxtBackend,
    backend::ChainBackend,
};

/// A named connection with its submitter and query helper.
#[derive(Clone)]
pub struct ChainClient {
    name: String,
    backend: Arc<dyn ChainBackend>,
    submitter: Submitter,
    query: StateQuery,
}

impl ChainClient {
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn ChainBackend>,
        options: SubmitOptions,
    ) -> Self {
        Self {
            name: name.into(),
            submitter: Submitter::new(backend.clone(), options),
            query: StateQuery::new(backend.clone()),
            backend,
        }
    }

    pub async fn connect(
        name: impl Into<String>,
        url: &str,
        options: SubmitOptions,
    ) -> Result<Self, ClientError> {
        let backend = SubxtBackend::connect(url).await?;
        Ok(Self::new(name, Arc::new(backend), options))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &Arc<dyn ChainBackend> {
        &self.backend
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    pub fn query(&self) -> &StateQuery {
        &self.query
    }

    pub async fn submit(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
    ) -> Result<Receipt, ClientError> {
        self.submitter.submit(call, signer).await
    }
}
