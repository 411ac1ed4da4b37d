//! Transaction Executor
//!
//! Drives one contract write from submission to a terminal outcome:
//!
//! ```text
//! Idle --execute--> Executing --confirmed--> Success
//!                       |
//!                       +------failure-----> Error
//! Success | Error --reset--> Idle
//! ```
//!
//! `execute` does its checks and the `Idle -> Executing` transition before it
//! returns; submission and the confirmation wait run on a task spawned on the
//! caller's tokio runtime and report back through the state channel and the
//! registered callbacks.

use super::callbacks::TransactionCallbacks;
use super::config::{ConfirmationPolicy, ExecutorConfig};
use super::dispatcher::ContractDispatcher;
use super::errors::ExecutionError;
use super::types::{ExecutionReceipt, ExecutionStatus, PreparedCall, Progress, TransactionRequest, TransactionState};
use crate::contracts::MethodCatalogue;
use crate::wallet::{ConnectedWallet, WalletConnector};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Progress once the network has accepted the transaction
const PROGRESS_SUBMITTED: u8 = 20;
/// Estimates stop here until the receipt arrives
const PROGRESS_CEILING: u8 = 95;

/// Knobs the executor needs from [`ExecutorConfig`]
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub confirmations: ConfirmationPolicy,
    pub progress_tick: Duration,
    /// Reject wallets connected to any other chain
    pub expected_chain_id: Option<u64>,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            confirmations: ConfirmationPolicy::default(),
            progress_tick: Duration::from_secs(1),
            expected_chain_id: None,
        }
    }
}

impl From<&ExecutorConfig> for ExecutionSettings {
    fn from(config: &ExecutorConfig) -> Self {
        Self {
            confirmations: config.confirmations.clone(),
            progress_tick: config.progress_tick(),
            expected_chain_id: Some(config.chain_id),
        }
    }
}

/// State machine for a single in-flight contract write.
///
/// One executor handles at most one transaction at a time: `execute` while
/// Executing returns [`ExecutionError::AlreadyExecuting`] and changes nothing.
/// There is no cancellation and no timeout at this level; dropping the executor
/// leaves the spawned task running to completion.
pub struct TransactionExecutor {
    wallet: WalletConnector,
    dispatcher: Arc<dyn ContractDispatcher>,
    catalogue: Arc<MethodCatalogue>,
    settings: ExecutionSettings,
    callbacks: TransactionCallbacks,
    state: Arc<watch::Sender<TransactionState>>,
}

type Prechecked = (Handle, ConnectedWallet, PreparedCall, u64);

/// Everything a drive task needs, detached from the executor's lifetime
struct DriveContext {
    dispatcher: Arc<dyn ContractDispatcher>,
    callbacks: TransactionCallbacks,
    state: Arc<watch::Sender<TransactionState>>,
    progress_tick: Duration,
}

impl TransactionExecutor {
    pub fn new(
        wallet: WalletConnector,
        dispatcher: Arc<dyn ContractDispatcher>,
        catalogue: Arc<MethodCatalogue>,
        settings: ExecutionSettings,
        callbacks: TransactionCallbacks,
    ) -> Self {
        let (state, _) = watch::channel(TransactionState::Idle);
        Self {
            wallet,
            dispatcher,
            catalogue,
            settings,
            callbacks,
            state: Arc::new(state),
        }
    }

    /// Submit `request` on the current tokio runtime.
    ///
    /// Returns `Err(AlreadyExecuting)` if a transaction is in flight. A missing
    /// wallet, a malformed request or the absence of a runtime moves the
    /// executor straight to `Error` (and fires the error callback) without any
    /// network call; `execute` itself still returns `Ok` in that case.
    pub fn execute(&self, request: TransactionRequest) -> Result<(), ExecutionError> {
        let prepared = self.precheck(&request);

        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if state.is_executing() {
                return false;
            }
            *state = match &prepared {
                Ok(_) => TransactionState::Executing { progress: Progress::ZERO },
                Err(error) => TransactionState::Error {
                    error: error.clone(),
                    progress: Progress::ZERO,
                },
            };
            claimed = true;
            true
        });

        if !claimed {
            warn!("Rejected `{}`: a transaction is already executing", request.method);
            return Err(ExecutionError::AlreadyExecuting);
        }

        match prepared {
            Err(error) => {
                warn!("Transaction `{}` failed before submission: {}", request.method, error);
                self.callbacks.notify_error(&error);
            }
            Ok((runtime, wallet, call, confirmations)) => {
                info!(
                    "Executing `{}` on {} from {} ({} confirmation(s) required)",
                    call.method, call.target, wallet.address, confirmations
                );
                let ctx = DriveContext {
                    dispatcher: Arc::clone(&self.dispatcher),
                    callbacks: self.callbacks.clone(),
                    state: Arc::clone(&self.state),
                    progress_tick: self.settings.progress_tick,
                };
                runtime.spawn(drive(ctx, wallet, call, confirmations));
            }
        }

        Ok(())
    }

    /// Return to Idle from Success or Error, clearing the result and progress.
    ///
    /// Rejected while Executing; a no-op when already Idle.
    pub fn reset(&self) -> Result<(), ExecutionError> {
        let mut rejected = false;
        self.state.send_if_modified(|state| match state {
            TransactionState::Executing { .. } => {
                rejected = true;
                false
            }
            TransactionState::Idle => false,
            TransactionState::Success { .. } | TransactionState::Error { .. } => {
                *state = TransactionState::Idle;
                true
            }
        });

        if rejected {
            warn!("Reset rejected: a transaction is executing");
            return Err(ExecutionError::ResetWhileExecuting);
        }
        debug!("Executor reset to idle");
        Ok(())
    }

    pub fn state(&self) -> TransactionState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.state.borrow().status()
    }

    pub fn progress(&self) -> Progress {
        self.state.borrow().progress()
    }

    pub fn is_executing(&self) -> bool {
        self.state.borrow().is_executing()
    }

    /// Stream of state changes for rendering. Intermediate states may be coalesced.
    pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
        self.state.subscribe()
    }

    /// Resolve at the next terminal state, or immediately if already terminal.
    ///
    /// Waits indefinitely while Idle.
    pub async fn wait_for_outcome(&self) -> Result<ExecutionReceipt, ExecutionError> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(TransactionState::is_terminal)
            .await
            .map_err(|_| ExecutionError::NetworkFailure("executor state channel closed".to_string()))?
            .clone();

        match state {
            TransactionState::Success { receipt } => Ok(receipt),
            TransactionState::Error { error, .. } => Err(error),
            // wait_for only returns terminal states
            TransactionState::Idle | TransactionState::Executing { .. } => {
                Err(ExecutionError::NetworkFailure("executor returned a non-terminal state".to_string()))
            }
        }
    }

    pub fn wallet(&self) -> &WalletConnector {
        &self.wallet
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// Everything that must hold before the network is touched
    fn precheck(&self, request: &TransactionRequest) -> Result<Prechecked, ExecutionError> {
        let wallet = self.wallet.current().ok_or(ExecutionError::NoSigningCapability)?;

        if let Some(expected) = self.settings.expected_chain_id {
            if wallet.chain_id != expected {
                return Err(ExecutionError::InvalidArguments(format!(
                    "wallet is connected to chain {}, expected {}",
                    wallet.chain_id, expected
                )));
            }
        }

        let call = self.catalogue.prepare(request)?;
        let confirmations = self.settings.confirmations.for_method(&request.method);
        let runtime = Handle::try_current().map_err(|_| ExecutionError::NoRuntime)?;
        Ok((runtime, wallet, call, confirmations))
    }
}

impl Drop for TransactionExecutor {
    fn drop(&mut self) {
        if self.is_executing() {
            warn!("TransactionExecutor dropped while executing; the transaction will still run to completion");
        }
    }
}

async fn drive(ctx: DriveContext, wallet: ConnectedWallet, call: PreparedCall, confirmations: u64) {
    let handle = match ctx.dispatcher.submit(&wallet, &call).await {
        Ok(handle) => handle,
        Err(error) => return fail(&ctx, error),
    };

    info!("Transaction {} accepted for `{}`, awaiting confirmation", handle.tx_hash, handle.method);
    advance(&ctx.state, Progress::new(PROGRESS_SUBMITTED));

    let state = Arc::clone(&ctx.state);
    let on_depth = move |depth: u64| {
        debug!("Confirmation depth {}/{}", depth, confirmations);
        advance(&state, progress_for_depth(depth, confirmations));
    };

    let wait = ctx.dispatcher.wait_for_confirmation(&handle, confirmations, &on_depth);
    tokio::pin!(wait);
    let mut ticker = tokio::time::interval(ctx.progress_tick);

    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            _ = ticker.tick() => nudge(&ctx.state),
        }
    };

    match outcome {
        Ok(receipt) => succeed(&ctx, receipt),
        Err(error) => fail(&ctx, error),
    }
}

fn succeed(ctx: &DriveContext, receipt: ExecutionReceipt) {
    info!(
        "Transaction {} confirmed in block {:?} ({} confirmation(s), gas used {})",
        receipt.tx_hash, receipt.block_number, receipt.confirmations, receipt.gas_used
    );
    ctx.state.send_replace(TransactionState::Success {
        receipt: receipt.clone(),
    });
    ctx.callbacks.notify_success(&receipt);
}

fn fail(ctx: &DriveContext, error: ExecutionError) {
    error!("Transaction failed: {}", error);
    ctx.state.send_modify(|state| {
        let progress = state.progress();
        *state = TransactionState::Error {
            error: error.clone(),
            progress,
        };
    });
    ctx.callbacks.notify_error(&error);
}

/// Raise progress while Executing; ignored in every other state
fn advance(state: &watch::Sender<TransactionState>, target: Progress) {
    state.send_if_modified(|state| match state {
        TransactionState::Executing { progress } => progress.advance_to(target),
        _ => false,
    });
}

/// Creep toward the ceiling so the UI keeps moving between confirmations
fn nudge(state: &watch::Sender<TransactionState>) {
    let current = state.borrow().progress().value();
    if current < PROGRESS_SUBMITTED {
        return;
    }
    let step = ((PROGRESS_CEILING.saturating_sub(current)) / 5).max(1);
    advance(state, Progress::new(current.saturating_add(step).min(PROGRESS_CEILING)));
}

fn progress_for_depth(depth: u64, required: u64) -> Progress {
    if required == 0 || depth >= required {
        return Progress::new(PROGRESS_CEILING);
    }
    let span = u64::from(PROGRESS_CEILING - PROGRESS_SUBMITTED);
    let value = u64::from(PROGRESS_SUBMITTED) + depth * span / required;
    Progress::new(value as u8)
}

/// Builder for TransactionExecutor
pub struct TransactionExecutorBuilder {
    wallet: WalletConnector,
    dispatcher: Arc<dyn ContractDispatcher>,
    catalogue: Option<Arc<MethodCatalogue>>,
    settings: ExecutionSettings,
    callbacks: TransactionCallbacks,
}

impl TransactionExecutorBuilder {
    pub fn new(wallet: WalletConnector, dispatcher: Arc<dyn ContractDispatcher>) -> Self {
        Self {
            wallet,
            dispatcher,
            catalogue: None,
            settings: ExecutionSettings::default(),
            callbacks: TransactionCallbacks::default(),
        }
    }

    pub fn with_config(mut self, config: &ExecutorConfig) -> Self {
        self.settings = ExecutionSettings::from(config);
        self
    }

    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_confirmations(mut self, confirmations: ConfirmationPolicy) -> Self {
        self.settings.confirmations = confirmations;
        self
    }

    pub fn with_progress_tick(mut self, tick: Duration) -> Self {
        self.settings.progress_tick = tick;
        self
    }

    pub fn with_catalogue(mut self, catalogue: Arc<MethodCatalogue>) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    pub fn with_callbacks(mut self, callbacks: TransactionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&ExecutionReceipt) + Send + Sync + 'static) -> Self {
        self.callbacks = self.callbacks.on_success(callback);
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&ExecutionError) + Send + Sync + 'static) -> Self {
        self.callbacks = self.callbacks.on_error(callback);
        self
    }

    pub fn build(self) -> TransactionExecutor {
        let catalogue = self
            .catalogue
            .unwrap_or_else(|| Arc::new(MethodCatalogue::jobsecure()));
        TransactionExecutor::new(self.wallet, self.dispatcher, catalogue, self.settings, self.callbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_for_depth() {
        assert_eq!(progress_for_depth(0, 0).value(), PROGRESS_CEILING);
        assert_eq!(progress_for_depth(0, 3).value(), PROGRESS_SUBMITTED);
        assert!(progress_for_depth(1, 3) < progress_for_depth(2, 3));
        assert_eq!(progress_for_depth(3, 3).value(), PROGRESS_CEILING);
        assert_eq!(progress_for_depth(10, 3).value(), PROGRESS_CEILING);
    }

    #[test]
    fn test_advance_only_while_executing() {
        let (state, _) = watch::channel(TransactionState::Executing { progress: Progress::new(30) });
        advance(&state, Progress::new(10));
        assert_eq!(state.borrow().progress().value(), 30);
        advance(&state, Progress::new(50));
        assert_eq!(state.borrow().progress().value(), 50);

        state.send_replace(TransactionState::Error {
            error: ExecutionError::NetworkFailure("gone".to_string()),
            progress: Progress::new(50),
        });
        advance(&state, Progress::new(90));
        assert_eq!(state.borrow().progress().value(), 50);
    }

    #[test]
    fn test_nudge_stays_below_ceiling() {
        let (state, _) = watch::channel(TransactionState::Executing { progress: Progress::new(PROGRESS_SUBMITTED) });
        for _ in 0..200 {
            nudge(&state);
        }
        assert_eq!(state.borrow().progress().value(), PROGRESS_CEILING);

        // nothing moves before submission is accepted
        let (state, _) = watch::channel(TransactionState::Executing { progress: Progress::ZERO });
        nudge(&state);
        assert_eq!(state.borrow().progress(), Progress::ZERO);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ExecutorConfig {
            chain_id: 11155111,
            progress_tick_ms: 250,
            ..ExecutorConfig::default()
        };
        let settings = ExecutionSettings::from(&config);
        assert_eq!(settings.expected_chain_id, Some(11155111));
        assert_eq!(settings.progress_tick, Duration::from_millis(250));
        assert_eq!(settings.confirmations.for_method("joinDAO"), 2);
    }
}
