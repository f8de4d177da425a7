//! Exponential backoff for connecting and read-only RPC requests.
//!
//! Submissions never go through here: a rejected extrinsic is a test result.

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::{debug, warn};

use crate::ClientError;

const INITIAL_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 10_000;
pub const MAX_RETRIES: usize = 8;

fn compute_delay(attempt: usize) -> Duration {
    let base_delay = INITIAL_DELAY_MS.saturating_mul(1 << attempt.min(10));
    let capped_delay = base_delay.min(MAX_DELAY_MS);
    let jitter = rand::thread_rng().gen_range(0..=capped_delay / 4);
    Duration::from_millis(capped_delay + jitter)
}

pub async fn with_retry<F, Fut, T>(operation_name: &str, mut f: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_transient() {
                    debug!(
                        operation = %operation_name,
                        error = %err,
                        "Non-transient error, not retrying"
                    );
                    return Err(err);
                }

                if attempt >= MAX_RETRIES {
                    warn!(
                        operation = %operation_name,
                        attempts = %attempt,
                        error = %err,
                        "Max retries exceeded"
                    );
                    return Err(err);
                }

                let delay = compute_delay(attempt);
                warn!(
                    operation = %operation_name,
                    attempt = %(attempt + 1),
                    max_attempts = %MAX_RETRIES,
                    delay_ms = %delay.as_millis(),
                    error = %err,
                    "Transient RPC error, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn delay_is_capped() {
        for attempt in [0, 3, 20] {
            let delay = compute_delay(attempt).as_millis() as u64;
            assert!(delay <= MAX_DELAY_MS + MAX_DELAY_MS / 4);
        }
        assert!(compute_delay(0).as_millis() as u64 >= INITIAL_DELAY_MS);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("connect", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ClientError::Connect {
                    url: "ws://127.0.0.1:9944".into(),
                    reason: "refused".into(),
                })
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_fail_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry("fetch", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ClientError::decode("System.Account", "unexpected shape"))
        })
        .await;
        assert!(matches!(result, Err(ClientError::Decode { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry("connect", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ClientError::Rpc("connection closed".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }
}
