use super::errors::ExecutionError;
use super::types::ExecutionReceipt;
use std::fmt;
use std::sync::Arc;

pub type SuccessCallback = Arc<dyn Fn(&ExecutionReceipt) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&ExecutionError) + Send + Sync>;

/// Success/error handlers registered when an executor is built.
///
/// The executor calls exactly one of them, exactly once, per terminal state.
#[derive(Clone, Default)]
pub struct TransactionCallbacks {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl TransactionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, callback: impl Fn(&ExecutionReceipt) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&ExecutionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub(crate) fn notify_success(&self, receipt: &ExecutionReceipt) {
        if let Some(callback) = &self.on_success {
            callback(receipt);
        }
    }

    pub(crate) fn notify_error(&self, error: &ExecutionError) {
        if let Some(callback) = &self.on_error {
            callback(error);
        }
    }
}

impl fmt::Debug for TransactionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
