use alloy_primitives::TxHash;
use alloy_transport::{RpcError, TransportErrorKind};
use std::time::Duration;

/// EIP-1193 "user rejected request" code returned by wallets.
pub const USER_REJECTED_CODE: i64 = 4001;
/// JSON-RPC code nodes use when `eth_call`/`eth_estimateGas` hits a revert
pub const EXECUTION_REVERTED_CODE: i64 = 3;

const REVERT_PREFIX: &str = "execution reverted";

/// Everything that can end a transaction in the `Error` state, plus the two
/// calls the executor refuses outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("no wallet connected")]
    NoSigningCapability,
    #[error("no tokio runtime available to drive the transaction")]
    NoRuntime,
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// `tx_hash` is `None` when the revert surfaced during gas estimation, before broadcast
    #[error("execution reverted{}", revert_detail(.tx_hash, .reason))]
    ExecutionReverted {
        tx_hash: Option<TxHash>,
        reason: Option<String>,
    },
    #[error("transaction {tx_hash} not confirmed after {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    // Rejections of the call itself; these never reach the state machine.
    #[error("a transaction is already executing")]
    AlreadyExecuting,
    #[error("cannot reset while a transaction is executing")]
    ResetWhileExecuting,
}

impl ExecutionError {
    /// True for errors that were caught before anything touched the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NoSigningCapability
                | Self::NoRuntime
                | Self::InvalidArguments(_)
                | Self::AlreadyExecuting
                | Self::ResetWhileExecuting
        )
    }

    /// Revert reported by the node in place of a transaction hash
    pub fn reverted_before_broadcast(message: &str) -> Self {
        let reason = message
            .strip_prefix(REVERT_PREFIX)
            .map(|rest| rest.trim_start_matches(':').trim())
            .unwrap_or(message)
            .trim();
        Self::ExecutionReverted {
            tx_hash: None,
            reason: (!reason.is_empty()).then(|| reason.to_string()),
        }
    }
}

fn revert_detail(tx_hash: &Option<TxHash>, reason: &Option<String>) -> String {
    let mut detail = String::new();
    if let Some(reason) = reason {
        detail.push_str(": ");
        detail.push_str(reason);
    }
    if let Some(tx_hash) = tx_hash {
        detail.push_str(&format!(" in transaction {}", tx_hash));
    }
    detail
}

impl From<RpcError<TransportErrorKind>> for ExecutionError {
    fn from(error: RpcError<TransportErrorKind>) -> Self {
        match error {
            RpcError::ErrorResp(payload) if payload.code == USER_REJECTED_CODE => {
                Self::SubmissionRejected(format!("user rejected the request: {}", payload.message))
            }
            RpcError::ErrorResp(payload)
                if payload.code == EXECUTION_REVERTED_CODE || payload.message.starts_with(REVERT_PREFIX) =>
            {
                Self::reverted_before_broadcast(&payload.message)
            }
            RpcError::ErrorResp(payload) => Self::SubmissionRejected(payload.message.to_string()),
            // signing and filling failures happen before broadcast
            RpcError::LocalUsageError(err) => Self::SubmissionRejected(err.to_string()),
            RpcError::Transport(kind) => Self::NetworkFailure(kind.to_string()),
            err => Self::NetworkFailure(err.to_string()),
        }
    }
}

impl From<alloy_dyn_abi::Error> for ExecutionError {
    fn from(error: alloy_dyn_abi::Error) -> Self {
        Self::InvalidArguments(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_wallet_message() {
        assert_eq!(ExecutionError::NoSigningCapability.to_string(), "no wallet connected");
    }

    #[test]
    fn test_local_classification() {
        assert!(ExecutionError::NoSigningCapability.is_local());
        assert!(ExecutionError::InvalidArguments("bad".into()).is_local());
        assert!(!ExecutionError::NetworkFailure("down".into()).is_local());
        assert!(ExecutionError::NoRuntime.is_local());
        assert!(
            !ExecutionError::ExecutionReverted {
                tx_hash: Some(TxHash::ZERO),
                reason: None
            }
            .is_local()
        );
    }

    #[test]
    fn test_transport_error_is_network_failure() {
        let err: ExecutionError = TransportErrorKind::backend_gone().into();
        assert!(matches!(err, ExecutionError::NetworkFailure(_)));
    }

    fn error_response(code: i64, message: &str) -> RpcError<TransportErrorKind> {
        RpcError::ErrorResp(serde_json::from_value(serde_json::json!({ "code": code, "message": message })).unwrap())
    }

    #[test]
    fn test_estimation_revert_is_execution_reverted() {
        let err: ExecutionError = error_response(3, "execution reverted: not a member").into();
        assert_eq!(
            err,
            ExecutionError::ExecutionReverted {
                tx_hash: None,
                reason: Some("not a member".to_string()),
            }
        );
        assert_eq!(err.to_string(), "execution reverted: not a member");

        // some nodes use the generic server error code
        let err: ExecutionError = error_response(-32000, "execution reverted").into();
        assert_eq!(
            err,
            ExecutionError::ExecutionReverted {
                tx_hash: None,
                reason: None
            }
        );
    }

    #[test]
    fn test_error_responses() {
        let err: ExecutionError = error_response(4001, "User denied transaction signature").into();
        assert_eq!(
            err,
            ExecutionError::SubmissionRejected("user rejected the request: User denied transaction signature".to_string())
        );

        let err: ExecutionError = error_response(-32000, "insufficient funds for gas * price + value").into();
        assert!(matches!(err, ExecutionError::SubmissionRejected(_)));
    }

    #[test]
    fn test_receipt_revert_message() {
        let err = ExecutionError::ExecutionReverted {
            tx_hash: Some(TxHash::ZERO),
            reason: None,
        };
        assert_eq!(err.to_string(), format!("execution reverted in transaction {}", TxHash::ZERO));
    }
}
