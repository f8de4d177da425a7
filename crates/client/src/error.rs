use crate::backend::Confirmation;
use subxt::utils::H256;

/// Failures talking to the node.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction invalid: {0}")]
    Invalid(String),

    #[error("transaction dropped: {0}")]
    Dropped(String),

    #[error("transaction error: {0}")]
    TxError(String),

    #[error("dispatch failed in block {block:?}: {reason}")]
    DispatchFailed { block: H256, reason: String },

    #[error("status stream ended before the transaction was {0}")]
    StreamClosed(Confirmation),

    #[error("no terminal status after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },
}

impl ClientError {
    /// Errors worth retrying for read-only requests and connection setup.
    /// Submission errors are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect { .. } => true,
            Self::Rpc(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("connection")
                    || msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("rate limit")
                    || msg.contains("too many requests")
                    || msg.contains("503")
                    || msg.contains("temporarily unavailable")
                    || msg.contains("reset by peer")
                    || msg.contains("broken pipe")
                    || msg.contains("restart")
            }
            _ => false,
        }
    }

    /// Whether the node (or the runtime) rejected the transaction.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Invalid(_) | Self::Dropped(_) | Self::TxError(_) | Self::DispatchFailed { .. }
        )
    }

    pub(crate) fn decode(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode { what: what.into(), reason: reason.to_string() }
    }
}

impl From<subxt::Error> for ClientError {
    fn from(err: subxt::Error) -> Self {
        Self::Rpc(err.to_string())
    }
}
