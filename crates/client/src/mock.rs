//! A scripted in-memory [`ChainBackend`] for tests.
//!
//! Status sequences are scripted per submission, unsubscribes are counted,
//! nonces advance like a real node unless frozen, and a small ledger backs
//! the storage entries the query helpers read.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use subxt::{
    dynamic::Value,
    utils::{AccountId32, H256},
};
use subxt_signer::sr25519::Keypair;
use sygma_primitives::{DomainId, MpcAddress, RuntimeCall};

use crate::{
    ClientError,
    backend::{
        BlockRef, ChainBackend, ChainEvent, Confirmation, EventWatch, StorageQuery, TxStatus,
        TxWatch,
    },
};

/// One step of a scripted status stream.
#[derive(Clone, Debug)]
pub enum MockStep {
    Status(TxStatus),
    /// The stream yields an RPC error.
    Fail(String),
    /// The stream never yields again.
    Hang,
}

#[derive(Clone, Debug)]
pub struct Submission {
    pub call: RuntimeCall,
    pub signer: AccountId32,
    pub nonce: u64,
}

type Effect = Arc<dyn Fn(&RuntimeCall, &AccountId32, &mut MockLedger) + Send + Sync>;

/// Chain state visible through [`ChainBackend::fetch_storage`].
#[derive(Default)]
pub struct MockLedger {
    raw: HashMap<String, Value>,
    free: HashMap<[u8; 32], u128>,
    assets: HashMap<(u32, [u8; 32]), u128>,
}

impl MockLedger {
    pub fn set(&mut self, query: &StorageQuery, value: Value) {
        self.raw.insert(storage_key(query), value);
    }

    pub fn remove(&mut self, query: &StorageQuery) {
        self.raw.remove(&storage_key(query));
    }

    pub fn free(&self, account: &AccountId32) -> u128 {
        self.free.get(&account.0).copied().unwrap_or_default()
    }

    pub fn set_free(&mut self, account: &AccountId32, free: u128) {
        self.free.insert(account.0, free);
        self.set(&StorageQuery::system_account(account), account_info_value(free));
    }

    pub fn credit_free(&mut self, account: &AccountId32, amount: u128) {
        let free = self.free(account).saturating_add(amount);
        self.set_free(account, free);
    }

    pub fn debit_free(&mut self, account: &AccountId32, amount: u128) {
        let free = self.free(account).saturating_sub(amount);
        self.set_free(account, free);
    }

    pub fn asset_balance(&self, asset: u32, account: &AccountId32) -> u128 {
        self.assets.get(&(asset, account.0)).copied().unwrap_or_default()
    }

    pub fn set_asset_balance(&mut self, asset: u32, account: &AccountId32, balance: u128) {
        self.assets.insert((asset, account.0), balance);
        self.set(&StorageQuery::asset_account(asset, account), asset_account_value(balance));
    }

    pub fn credit_asset(&mut self, asset: u32, account: &AccountId32, amount: u128) {
        let balance = self.asset_balance(asset, account).saturating_add(amount);
        self.set_asset_balance(asset, account, balance);
    }

    pub fn debit_asset(&mut self, asset: u32, account: &AccountId32, amount: u128) {
        let balance = self.asset_balance(asset, account).saturating_sub(amount);
        self.set_asset_balance(asset, account, balance);
    }

    pub fn set_mpc_address(&mut self, address: MpcAddress) {
        self.set(&StorageQuery::mpc_address(), Value::unnamed_composite([address.to_value()]));
    }

    pub fn set_paused(&mut self, domain: DomainId, paused: bool) {
        self.set(&StorageQuery::is_paused(domain), Value::bool(paused));
    }

    pub fn register_domain(&mut self, domain: DomainId) {
        self.set(&StorageQuery::dest_domain(domain), Value::bool(true));
    }
}

#[derive(Default)]
struct MockState {
    nonces: HashMap<[u8; 32], u64>,
    freeze_nonces: bool,
    scripts: VecDeque<Vec<MockStep>>,
    submit_failures: VecDeque<String>,
    submissions: Vec<Submission>,
    ledger: MockLedger,
    effects: Vec<Effect>,
    events: VecDeque<Vec<ChainEvent>>,
    hang_events: bool,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    tx_unsubscribes: Arc<AtomicUsize>,
    event_unsubscribes: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deterministic block reference for scripted statuses.
    pub fn block(n: u64) -> BlockRef {
        BlockRef {
            block_hash: H256::from_low_u64_be(n),
            extrinsic_hash: H256::from_low_u64_be(n << 32),
        }
    }

    /// Queues the status stream of the next submission. Unscripted
    /// submissions go through `Validated`, `Broadcast`, `InBlock`, `Finalized`.
    pub fn script_next(&self, steps: Vec<MockStep>) {
        self.state.lock().scripts.push_back(steps);
    }

    /// Makes the next `submit_and_watch` fail before a subscription exists.
    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        self.state.lock().submit_failures.push_back(reason.into());
    }

    pub fn set_nonce(&self, account: &AccountId32, nonce: u64) {
        self.state.lock().nonces.insert(account.0, nonce);
    }

    /// Stops the node nonce from advancing on submission.
    pub fn freeze_nonces(&self, frozen: bool) {
        self.state.lock().freeze_nonces = frozen;
    }

    /// Runs `effect` against the ledger for every accepted submission.
    pub fn on_submit<F>(&self, effect: F)
    where
        F: Fn(&RuntimeCall, &AccountId32, &mut MockLedger) + Send + Sync + 'static,
    {
        self.state.lock().effects.push(Arc::new(effect));
    }

    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut MockLedger) -> R) -> R {
        f(&mut self.state.lock().ledger)
    }

    pub fn push_events(&self, events: Vec<ChainEvent>) {
        self.state.lock().events.push_back(events);
    }

    /// Keeps event subscriptions open after the queued blocks are drained.
    pub fn hang_events(&self, hang: bool) {
        self.state.lock().hang_events = hang;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }

    pub fn tx_unsubscribes(&self) -> usize {
        self.tx_unsubscribes.load(Ordering::SeqCst)
    }

    pub fn event_unsubscribes(&self) -> usize {
        self.event_unsubscribes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainBackend for MockBackend {
    async fn account_nonce(&self, account: &AccountId32) -> Result<u64, ClientError> {
        Ok(self.state.lock().nonces.get(&account.0).copied().unwrap_or_default())
    }

    async fn submit_and_watch(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
        nonce: u64,
    ) -> Result<Box<dyn TxWatch>, ClientError> {
        let account = signer.public_key().to_account_id();
        let mut state = self.state.lock();

        if let Some(reason) = state.submit_failures.pop_front() {
            return Err(ClientError::Rpc(reason));
        }

        let index = state.submissions.len() as u64 + 1;
        state.submissions.push(Submission { call: call.clone(), signer: account.clone(), nonce });
        if !state.freeze_nonces {
            state.nonces.insert(account.0, nonce + 1);
        }

        let effects = state.effects.clone();
        for effect in effects {
            effect(call, &account, &mut state.ledger);
        }

        let steps = state.scripts.pop_front().unwrap_or_else(|| {
            let block = Self::block(index);
            vec![
                MockStep::Status(TxStatus::Validated),
                MockStep::Status(TxStatus::Broadcast),
                MockStep::Status(TxStatus::InBlock(block)),
                MockStep::Status(TxStatus::Finalized(block)),
            ]
        });

        Ok(Box::new(MockTxWatch {
            steps: steps.into(),
            unsubscribes: self.tx_unsubscribes.clone(),
        }))
    }

    async fn fetch_storage(&self, query: &StorageQuery) -> Result<Option<Value>, ClientError> {
        Ok(self.state.lock().ledger.raw.get(&storage_key(query)).cloned())
    }

    async fn subscribe_events(
        &self,
        _confirmation: Confirmation,
    ) -> Result<Box<dyn EventWatch>, ClientError> {
        let mut state = self.state.lock();
        Ok(Box::new(MockEventWatch {
            blocks: std::mem::take(&mut state.events),
            hang: state.hang_events,
            unsubscribes: self.event_unsubscribes.clone(),
        }))
    }
}

struct MockTxWatch {
    steps: VecDeque<MockStep>,
    unsubscribes: Arc<AtomicUsize>,
}

#[async_trait]
impl TxWatch for MockTxWatch {
    async fn next_status(&mut self) -> Option<Result<TxStatus, ClientError>> {
        match self.steps.pop_front()? {
            MockStep::Status(status) => Some(Ok(status)),
            MockStep::Fail(reason) => Some(Err(ClientError::Rpc(reason))),
            MockStep::Hang => std::future::pending().await,
        }
    }

    fn unsubscribe(self: Box<Self>) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockEventWatch {
    blocks: VecDeque<Vec<ChainEvent>>,
    hang: bool,
    unsubscribes: Arc<AtomicUsize>,
}

#[async_trait]
impl EventWatch for MockEventWatch {
    async fn next_events(&mut self) -> Option<Result<Vec<ChainEvent>, ClientError>> {
        match self.blocks.pop_front() {
            Some(events) => Some(Ok(events)),
            None if self.hang => std::future::pending().await,
            None => None,
        }
    }

    fn unsubscribe(self: Box<Self>) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
    }
}

fn storage_key(query: &StorageQuery) -> String {
    format!("{}.{}{:?}", query.pallet, query.entry, query.keys)
}

fn account_info_value(free: u128) -> Value {
    Value::named_composite([
        ("nonce", Value::u128(0)),
        ("consumers", Value::u128(0)),
        ("providers", Value::u128(1)),
        ("sufficients", Value::u128(0)),
        (
            "data",
            Value::named_composite([
                ("free", Value::u128(free)),
                ("reserved", Value::u128(0)),
                ("frozen", Value::u128(0)),
                ("flags", Value::u128(0)),
            ]),
        ),
    ])
}

fn asset_account_value(balance: u128) -> Value {
    Value::named_composite([
        ("balance", Value::u128(balance)),
        ("status", Value::unnamed_variant("Liquid", [])),
        ("reason", Value::unnamed_variant("Consumer", [])),
        ("extra", Value::unnamed_composite([])),
    ])
}
