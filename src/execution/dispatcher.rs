use super::errors::ExecutionError;
use super::types::{ExecutionReceipt, PreparedCall, SubmissionHandle};
use crate::wallet::ConnectedWallet;
use async_trait::async_trait;

/// Reports the confirmation depth seen so far while waiting
pub type DepthReporter<'a> = &'a (dyn Fn(u64) + Send + Sync);

/// The chain-facing half of a transaction: signing, broadcasting and waiting.
///
/// The executor owns the lifecycle; implementors only move bytes to and from a node.
#[async_trait]
pub trait ContractDispatcher: Send + Sync {
    /// Sign and broadcast `call`. Resolves once the network has accepted the transaction.
    async fn submit(&self, wallet: &ConnectedWallet, call: &PreparedCall) -> Result<SubmissionHandle, ExecutionError>;

    /// Wait until the transaction behind `handle` has `confirmations` blocks on top of it
    /// (0 means "as soon as a receipt exists"). No deadline unless the implementor sets one.
    async fn wait_for_confirmation(
        &self,
        handle: &SubmissionHandle,
        confirmations: u64,
        on_depth: DepthReporter<'_>,
    ) -> Result<ExecutionReceipt, ExecutionError>;
}
