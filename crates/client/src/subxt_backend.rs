//! [`ChainBackend`] over a live node, using subxt's dynamic API.

use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use subxt::{
    OnlineClient, PolkadotConfig,
    blocks::Block,
    config::DefaultExtrinsicParamsBuilder,
    dynamic::Value,
    tx::{TxInBlock, TxProgress, TxStatus as NodeTxStatus},
    utils::{AccountId32, H256},
};
use subxt_signer::sr25519::Keypair;
use sygma_primitives::RuntimeCall;
use tracing::{debug, info};

use crate::{
    ClientError,
    backend::{
        BlockRef, ChainBackend, ChainEvent, Confirmation, EventWatch, StorageQuery, TxStatus,
        TxWatch,
    },
    retry::with_retry,
};

type Client = OnlineClient<PolkadotConfig>;
type BlockStream = BoxStream<'static, Result<Block<PolkadotConfig, Client>, subxt::Error>>;

/// Static facts about the connected chain.
#[derive(Clone, Debug)]
pub struct ChainInfo {
    pub genesis_hash: H256,
    pub spec_version: u32,
    pub transaction_version: u32,
    pub best_block: u64,
}

pub struct SubxtBackend {
    url: String,
    api: Client,
}

impl SubxtBackend {
    /// Connects to a node over WebSocket, retrying transient failures.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let api = with_retry("connect", || async {
            Client::from_insecure_url(url).await.map_err(|e| ClientError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })
        .await?;

        let version = api.runtime_version();
        info!(
            url = %url,
            spec_version = version.spec_version,
            genesis = ?api.genesis_hash(),
            "Connected to node"
        );

        Ok(Self { url: url.to_string(), api })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn api(&self) -> &Client {
        &self.api
    }

    pub async fn chain_info(&self) -> Result<ChainInfo, ClientError> {
        let version = self.api.runtime_version();
        let best = with_retry("latest_block", || async {
            Ok::<_, ClientError>(self.api.blocks().at_latest().await?)
        })
        .await?;

        Ok(ChainInfo {
            genesis_hash: self.api.genesis_hash(),
            spec_version: version.spec_version,
            transaction_version: version.transaction_version,
            best_block: best.number().into(),
        })
    }
}

#[async_trait]
impl ChainBackend for SubxtBackend {
    async fn account_nonce(&self, account: &AccountId32) -> Result<u64, ClientError> {
        with_retry("account_nonce", || async {
            Ok::<_, ClientError>(self.api.tx().account_nonce(account).await?)
        })
        .await
    }

    async fn submit_and_watch(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
        nonce: u64,
    ) -> Result<Box<dyn TxWatch>, ClientError> {
        let lowered = call.lower();
        let payload = subxt::dynamic::tx(lowered.pallet, lowered.call, lowered.fields);
        // No mortality set: the extrinsic is immortal.
        let params = DefaultExtrinsicParamsBuilder::<PolkadotConfig>::new().nonce(nonce).build();

        let progress = self.api.tx().sign_and_submit_then_watch(&payload, signer, params).await?;
        debug!(call = %call, nonce, "Extrinsic submitted");

        Ok(Box::new(SubxtTxWatch { progress }))
    }

    async fn fetch_storage(&self, query: &StorageQuery) -> Result<Option<Value>, ClientError> {
        let keys = query.keys.clone();
        let address = subxt::dynamic::storage(query.pallet.as_str(), query.entry.as_str(), keys);

        let thunk = with_retry("fetch_storage", || async {
            Ok::<_, ClientError>(self.api.storage().at_latest().await?.fetch(&address).await?)
        })
        .await?;

        thunk
            .map(|thunk| {
                thunk
                    .to_value()
                    .map(|value| value.remove_context())
                    .map_err(|e| ClientError::decode(query.to_string(), e))
            })
            .transpose()
    }

    async fn subscribe_events(
        &self,
        confirmation: Confirmation,
    ) -> Result<Box<dyn EventWatch>, ClientError> {
        let blocks = match confirmation {
            Confirmation::InBlock => self.api.blocks().subscribe_best().await?.boxed(),
            Confirmation::Finalized => self.api.blocks().subscribe_finalized().await?.boxed(),
        };
        Ok(Box::new(SubxtEventWatch { blocks }))
    }
}

struct SubxtTxWatch {
    progress: TxProgress<PolkadotConfig, Client>,
}

#[async_trait]
impl TxWatch for SubxtTxWatch {
    async fn next_status(&mut self) -> Option<Result<TxStatus, ClientError>> {
        let status = match self.progress.next().await? {
            Ok(status) => status,
            Err(err) => return Some(Err(err.into())),
        };

        Some(match status {
            NodeTxStatus::Validated { .. } => Ok(TxStatus::Validated),
            NodeTxStatus::Broadcasted { .. } => Ok(TxStatus::Broadcast),
            NodeTxStatus::NoLongerInBestBlock { .. } => Ok(TxStatus::Retracted),
            NodeTxStatus::InBestBlock(tx) => landed(tx, Confirmation::InBlock).await,
            NodeTxStatus::InFinalizedBlock(tx) => landed(tx, Confirmation::Finalized).await,
            NodeTxStatus::Error { message } => Ok(TxStatus::Error(message)),
            NodeTxStatus::Invalid { message } => Ok(TxStatus::Invalid(message)),
            NodeTxStatus::Dropped { message } => Ok(TxStatus::Dropped(message)),
        })
    }

    fn unsubscribe(self: Box<Self>) {
        // Dropping the progress stream closes the RPC subscription.
        drop(self);
    }
}

/// Reports inclusion, or the dispatch error if the runtime rejected the call.
async fn landed(
    tx: TxInBlock<PolkadotConfig, Client>,
    depth: Confirmation,
) -> Result<TxStatus, ClientError> {
    let block = BlockRef { block_hash: tx.block_hash(), extrinsic_hash: tx.extrinsic_hash() };
    match tx.wait_for_success().await {
        Ok(_) => Ok(match depth {
            Confirmation::InBlock => TxStatus::InBlock(block),
            Confirmation::Finalized => TxStatus::Finalized(block),
        }),
        Err(subxt::Error::Runtime(err)) => {
            Ok(TxStatus::DispatchFailed { block: block.block_hash, reason: err.to_string() })
        }
        Err(err) => Err(err.into()),
    }
}

struct SubxtEventWatch {
    blocks: BlockStream,
}

#[async_trait]
impl EventWatch for SubxtEventWatch {
    async fn next_events(&mut self) -> Option<Result<Vec<ChainEvent>, ClientError>> {
        let block = match self.blocks.next().await? {
            Ok(block) => block,
            Err(err) => return Some(Err(err.into())),
        };
        Some(block_events(block).await)
    }

    fn unsubscribe(self: Box<Self>) {
        drop(self);
    }
}

async fn block_events(
    block: Block<PolkadotConfig, Client>,
) -> Result<Vec<ChainEvent>, ClientError> {
    let block_hash = block.hash();
    let events = block.events().await?;

    events
        .iter()
        .map(|event| -> Result<ChainEvent, ClientError> {
            let event = event.map_err(|e| ClientError::decode("block events", e))?;
            let fields = event
                .field_values()
                .map(|values| values.to_string())
                .map_err(|e| ClientError::decode("event fields", e))?;
            Ok(ChainEvent {
                block_hash,
                pallet: event.pallet_name().to_string(),
                variant: event.variant_name().to_string(),
                fields,
            })
        })
        .collect()
}
