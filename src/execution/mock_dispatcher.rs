use super::dispatcher::{ContractDispatcher, DepthReporter};
use super::errors::ExecutionError;
use super::types::{ExecutionReceipt, PreparedCall, SubmissionHandle};
use crate::wallet::ConnectedWallet;
use alloy_primitives::{TxHash, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// In-memory dispatcher with scripted outcomes, for tests and demos.
///
/// Optional gates hold `submit` or the confirmation wait until the test
/// calls `notify_one` on them.
#[derive(Debug, Default)]
pub struct MockDispatcher {
    submit_error: Mutex<Option<ExecutionError>>,
    confirmation_error: Mutex<Option<ExecutionError>>,
    submit_gate: Option<Arc<Notify>>,
    confirmation_gate: Option<Arc<Notify>>,
    block_number: u64,
    submissions: Mutex<Vec<PreparedCall>>,
    requested_confirmations: Mutex<Vec<u64>>,
    submit_count: AtomicUsize,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            block_number: 100,
            ..Self::default()
        }
    }

    pub fn reject_submission(self, error: ExecutionError) -> Self {
        *self.submit_error.lock() = Some(error);
        self
    }

    pub fn fail_confirmation(self, error: ExecutionError) -> Self {
        *self.confirmation_error.lock() = Some(error);
        self
    }

    pub fn with_submit_gate(mut self, gate: Arc<Notify>) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    pub fn with_confirmation_gate(mut self, gate: Arc<Notify>) -> Self {
        self.confirmation_gate = Some(gate);
        self
    }

    /// Make subsequent submissions succeed again
    pub fn clear_failures(&self) {
        self.submit_error.lock().take();
        self.confirmation_error.lock().take();
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<PreparedCall> {
        self.submissions.lock().clone()
    }

    pub fn requested_confirmations(&self) -> Vec<u64> {
        self.requested_confirmations.lock().clone()
    }

    /// Hash handed out for the n-th submission (1-based)
    pub fn tx_hash_for(n: usize) -> TxHash {
        TxHash::from(U256::from(n).to_be_bytes::<32>())
    }

    /// Receipt returned for `handle` once the scripted wait completes
    pub fn receipt_for(&self, handle: &SubmissionHandle, confirmations: u64) -> ExecutionReceipt {
        ExecutionReceipt {
            tx_hash: handle.tx_hash,
            block_number: Some(self.block_number),
            gas_used: 21_000,
            confirmations,
        }
    }
}

#[async_trait]
impl ContractDispatcher for MockDispatcher {
    async fn submit(&self, _wallet: &ConnectedWallet, call: &PreparedCall) -> Result<SubmissionHandle, ExecutionError> {
        let n = self.submit_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.submissions.lock().push(call.clone());

        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }

        let scripted = self.submit_error.lock().clone();
        if let Some(error) = scripted {
            return Err(error);
        }

        Ok(SubmissionHandle {
            tx_hash: Self::tx_hash_for(n),
            method: call.method.clone(),
        })
    }

    async fn wait_for_confirmation(
        &self,
        handle: &SubmissionHandle,
        confirmations: u64,
        on_depth: DepthReporter<'_>,
    ) -> Result<ExecutionReceipt, ExecutionError> {
        self.requested_confirmations.lock().push(confirmations);

        if let Some(gate) = &self.confirmation_gate {
            gate.notified().await;
        }

        let scripted = self.confirmation_error.lock().clone();
        if let Some(error) = scripted {
            return Err(error);
        }

        for depth in 1..=confirmations {
            on_depth(depth);
            tokio::task::yield_now().await;
        }

        Ok(self.receipt_for(handle, confirmations))
    }
}
