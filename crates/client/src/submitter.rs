//! Extrinsic submission.
//!
//! A submission fetches the signer's nonce, signs and submits the call, then
//! follows its status until the requested [`Confirmation`] depth or a
//! node-reported failure. The status subscription is released exactly once on
//! every exit path.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use subxt::utils::{AccountId32, H256};
use subxt_signer::sr25519::Keypair;
use sygma_primitives::RuntimeCall;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    ClientError,
    backend::{BlockRef, ChainBackend, Confirmation, TxStatus, TxWatch},
    metrics::SubmitterMetrics,
};

/// Per-submission settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub confirmation: Confirmation,
    /// Give up after this long without a terminal status. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl SubmitOptions {
    pub fn in_block() -> Self {
        Self { confirmation: Confirmation::InBlock, timeout: None }
    }

    pub fn finalized() -> Self {
        Self { confirmation: Confirmation::Finalized, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Proof that a submission reached the requested depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub block_hash: H256,
    pub extrinsic_hash: H256,
    pub nonce: u64,
    /// The depth actually observed, at least the one requested.
    pub confirmation: Confirmation,
}

/// Remembers the last nonce used per account so back-to-back submissions
/// never reuse one, even when the node has not caught up yet or a previous
/// submission was rejected. Nonces only ever move forward.
#[derive(Debug, Default)]
pub struct NonceTracker {
    last: Mutex<HashMap<[u8; 32], u64>>,
}

impl NonceTracker {
    /// Picks `max(fetched, last + 1)` and records it.
    pub fn reserve(&self, account: &AccountId32, fetched: u64) -> u64 {
        let mut last = self.last.lock();
        let nonce = match last.get(&account.0) {
            Some(prev) => fetched.max(prev + 1),
            None => fetched,
        };
        last.insert(account.0, nonce);
        nonce
    }

    pub fn last(&self, account: &AccountId32) -> Option<u64> {
        self.last.lock().get(&account.0).copied()
    }
}

#[derive(Clone)]
pub struct Submitter {
    backend: Arc<dyn ChainBackend>,
    nonces: Arc<NonceTracker>,
    options: SubmitOptions,
    metrics: SubmitterMetrics,
}

impl Submitter {
    pub fn new(backend: Arc<dyn ChainBackend>, options: SubmitOptions) -> Self {
        Self {
            backend,
            nonces: Arc::new(NonceTracker::default()),
            options,
            metrics: SubmitterMetrics,
        }
    }

    pub fn options(&self) -> SubmitOptions {
        self.options
    }

    pub fn nonces(&self) -> &NonceTracker {
        &self.nonces
    }

    /// Submits with the default options of this submitter.
    pub async fn submit(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
    ) -> Result<Receipt, ClientError> {
        self.submit_with(call, signer, self.options).await
    }

    pub async fn submit_with(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
        options: SubmitOptions,
    ) -> Result<Receipt, ClientError> {
        let account = signer.public_key().to_account_id();
        let fetched = self.backend.account_nonce(&account).await?;
        let nonce = self.nonces.reserve(&account, fetched);
        let (pallet, name) = (call.inner().pallet(), call.inner().name());

        info!(call = %call, signer = %account, nonce, "Submitting extrinsic");

        let mut watch = match self.backend.submit_and_watch(call, signer, nonce).await {
            Ok(watch) => watch,
            Err(err) => {
                warn!(call = %call, nonce, error = %err, "Submission rejected");
                self.metrics.record_outcome(pallet, name, "rejected");
                return Err(err);
            }
        };
        self.metrics.record_submitted(pallet, name);

        let started = Instant::now();
        let outcome = match options.timeout {
            Some(limit) => {
                let pending = follow(watch.as_mut(), options.confirmation);
                match tokio::time::timeout(limit, pending).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ClientError::Timeout(limit)),
                }
            }
            None => follow(watch.as_mut(), options.confirmation).await,
        };
        watch.unsubscribe();

        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.record_latency(pallet, name, elapsed);

        match outcome {
            Ok((block, confirmation)) => {
                self.metrics.record_outcome(
                    pallet,
                    name,
                    match confirmation {
                        Confirmation::InBlock => "in_block",
                        Confirmation::Finalized => "finalized",
                    },
                );
                Ok(Receipt {
                    block_hash: block.block_hash,
                    extrinsic_hash: block.extrinsic_hash,
                    nonce,
                    confirmation,
                })
            }
            Err(err) => {
                let label = match &err {
                    ClientError::Timeout(_) => "timeout",
                    ClientError::StreamClosed(_) => "closed",
                    e if e.is_rejection() => "rejected",
                    _ => "error",
                };
                self.metrics.record_outcome(pallet, name, label);
                warn!(call = %call, nonce, error = %err, "Extrinsic failed");
                Err(err)
            }
        }
    }
}

/// Reads statuses until the requested depth or a failure.
async fn follow(
    watch: &mut dyn TxWatch,
    depth: Confirmation,
) -> Result<(BlockRef, Confirmation), ClientError> {
    loop {
        let status = match watch.next_status().await {
            Some(Ok(status)) => status,
            Some(Err(err)) => return Err(err),
            None => return Err(ClientError::StreamClosed(depth)),
        };
        debug!(status = status.label(), "Current status");

        if let Some(err) = status.rejection() {
            return Err(err);
        }

        match status {
            TxStatus::InBlock(block) => {
                info!(block_hash = ?block.block_hash, "Transaction included");
                if depth == Confirmation::InBlock {
                    return Ok((block, Confirmation::InBlock));
                }
                info!("Waiting for finalization...");
            }
            TxStatus::Finalized(block) => {
                info!(block_hash = ?block.block_hash, "Transaction finalized");
                return Ok((block, Confirmation::Finalized));
            }
            TxStatus::Retracted => warn!("Block retracted, waiting for re-inclusion"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockStep};
    use subxt_signer::sr25519::dev;
    use sygma_primitives::DomainId;
    use test_case::test_case;

    fn pause() -> RuntimeCall {
        RuntimeCall::PauseBridge { domain: DomainId(1) }
    }

    fn submitter(mock: &MockBackend, options: SubmitOptions) -> Submitter {
        Submitter::new(Arc::new(mock.clone()), options)
    }

    #[tokio::test]
    async fn finalized_depth_waits_for_finalized() {
        let mock = MockBackend::new();
        mock.script_next(vec![
            MockStep::Status(TxStatus::Validated),
            MockStep::Status(TxStatus::Broadcast),
            MockStep::Status(TxStatus::InBlock(MockBackend::block(1))),
            MockStep::Status(TxStatus::Finalized(MockBackend::block(2))),
        ]);

        let receipt = submitter(&mock, SubmitOptions::finalized())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap();

        assert_eq!(receipt.confirmation, Confirmation::Finalized);
        assert_eq!(receipt.block_hash, MockBackend::block(2).block_hash);
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[tokio::test]
    async fn in_block_depth_resolves_on_inclusion() {
        let mock = MockBackend::new();
        mock.script_next(vec![
            MockStep::Status(TxStatus::Validated),
            MockStep::Status(TxStatus::InBlock(MockBackend::block(1))),
            MockStep::Hang,
        ]);

        let receipt = submitter(&mock, SubmitOptions::in_block())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap();

        assert_eq!(receipt.confirmation, Confirmation::InBlock);
        assert_eq!(receipt.block_hash, MockBackend::block(1).block_hash);
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[tokio::test]
    async fn in_block_depth_accepts_finalized_first() {
        let mock = MockBackend::new();
        mock.script_next(vec![MockStep::Status(TxStatus::Finalized(MockBackend::block(4)))]);

        let receipt = submitter(&mock, SubmitOptions::in_block())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap();

        assert_eq!(receipt.confirmation, Confirmation::Finalized);
    }

    #[tokio::test]
    async fn never_resolves_before_inclusion() {
        let mock = MockBackend::new();
        mock.script_next(vec![
            MockStep::Status(TxStatus::Validated),
            MockStep::Status(TxStatus::Broadcast),
        ]);

        let err = submitter(&mock, SubmitOptions::in_block())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::StreamClosed(Confirmation::InBlock)));
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[tokio::test]
    async fn finality_request_ignores_inclusion_alone() {
        let mock = MockBackend::new();
        mock.script_next(vec![
            MockStep::Status(TxStatus::InBlock(MockBackend::block(1))),
            MockStep::Status(TxStatus::Retracted),
            MockStep::Status(TxStatus::InBlock(MockBackend::block(2))),
        ]);

        let err = submitter(&mock, SubmitOptions::finalized())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::StreamClosed(Confirmation::Finalized)));
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[test_case(TxStatus::Invalid("Stale".into()) ; "invalid")]
    #[test_case(TxStatus::Dropped("pool limit".into()) ; "dropped")]
    #[test_case(TxStatus::Error("rpc gave up".into()) ; "error")]
    #[test_case(TxStatus::DispatchFailed { block: H256::zero(), reason: "BadOrigin".into() } ; "dispatch failed")]
    #[tokio::test]
    async fn node_errors_reject(failure: TxStatus) {
        let mock = MockBackend::new();
        mock.script_next(vec![
            MockStep::Status(TxStatus::Validated),
            MockStep::Status(failure),
            MockStep::Status(TxStatus::Finalized(MockBackend::block(1))),
        ]);

        let err = submitter(&mock, SubmitOptions::in_block())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap_err();

        assert!(err.is_rejection());
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[tokio::test]
    async fn stream_errors_unsubscribe_once() {
        let mock = MockBackend::new();
        mock.script_next(vec![
            MockStep::Status(TxStatus::Validated),
            MockStep::Fail("subscription dropped".into()),
        ]);

        let err = submitter(&mock, SubmitOptions::finalized())
            .submit(&pause(), &dev::alice())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_unsubscribes_once() {
        let mock = MockBackend::new();
        mock.script_next(vec![MockStep::Status(TxStatus::Broadcast), MockStep::Hang]);

        let options = SubmitOptions::finalized().with_timeout(Duration::from_secs(30));
        let err = submitter(&mock, options).submit(&pause(), &dev::alice()).await.unwrap_err();

        assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(mock.tx_unsubscribes(), 1);
    }

    #[tokio::test]
    async fn failed_submission_opens_no_subscription() {
        let mock = MockBackend::new();
        mock.fail_next_submit("1010: Invalid Transaction");

        let submitter = submitter(&mock, SubmitOptions::finalized());
        assert!(submitter.submit(&pause(), &dev::alice()).await.is_err());
        assert_eq!(mock.tx_unsubscribes(), 0);

        let account = dev::alice().public_key().to_account_id();
        assert_eq!(submitter.nonces().last(&account), Some(0));
    }

    #[tokio::test]
    async fn sequential_nonces_strictly_increase() {
        let mock = MockBackend::new();
        let account = dev::alice().public_key().to_account_id();
        mock.set_nonce(&account, 5);
        mock.freeze_nonces(true);

        let submitter = submitter(&mock, SubmitOptions::in_block());
        let mut nonces = Vec::new();
        for _ in 0..3 {
            nonces.push(submitter.submit(&pause(), &dev::alice()).await.unwrap().nonce);
        }

        assert_eq!(nonces, [5, 6, 7]);
        let submitted: Vec<_> = mock.submissions().iter().map(|s| s.nonce).collect();
        assert_eq!(submitted, [5, 6, 7]);
    }

    #[tokio::test]
    async fn chain_nonce_wins_when_ahead() {
        let mock = MockBackend::new();
        let account = dev::alice().public_key().to_account_id();

        let submitter = submitter(&mock, SubmitOptions::in_block());
        assert_eq!(submitter.submit(&pause(), &dev::alice()).await.unwrap().nonce, 0);

        mock.set_nonce(&account, 10);
        assert_eq!(submitter.submit(&pause(), &dev::alice()).await.unwrap().nonce, 10);
    }

    #[test_case(TxStatus::Invalid("Stale".into()) ; "invalid")]
    #[test_case(TxStatus::Dropped("pool limit".into()) ; "dropped")]
    #[tokio::test]
    async fn rejected_transaction_keeps_nonce_moving_forward(failure: TxStatus) {
        let mock = MockBackend::new();
        mock.freeze_nonces(true);
        mock.script_next(vec![MockStep::Status(failure)]);

        let submitter = submitter(&mock, SubmitOptions::in_block());
        assert!(submitter.submit(&pause(), &dev::alice()).await.is_err());
        let second = submitter.submit(&pause(), &dev::alice()).await.unwrap().nonce;

        let submitted: Vec<_> = mock.submissions().iter().map(|s| s.nonce).collect();
        assert_eq!(submitted, [0, 1]);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn failed_submit_does_not_reuse_nonce() {
        let mock = MockBackend::new();
        mock.freeze_nonces(true);
        mock.fail_next_submit("1010: Invalid Transaction");

        let submitter = submitter(&mock, SubmitOptions::in_block());
        assert!(submitter.submit(&pause(), &dev::alice()).await.is_err());
        assert_eq!(submitter.submit(&pause(), &dev::alice()).await.unwrap().nonce, 1);
    }

    #[test]
    fn tracker_never_moves_backwards() {
        let tracker = NonceTracker::default();
        let account = dev::bob().public_key().to_account_id();
        assert_eq!(tracker.reserve(&account, 3), 3);
        assert_eq!(tracker.reserve(&account, 3), 4);
        assert_eq!(tracker.reserve(&account, 0), 5);
        assert_eq!(tracker.reserve(&account, 9), 9);
        assert_eq!(tracker.last(&account), Some(9));
    }
}
