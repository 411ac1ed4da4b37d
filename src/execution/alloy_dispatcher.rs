use super::config::ExecutorConfig;
use super::dispatcher::{ContractDispatcher, DepthReporter};
use super::errors::ExecutionError;
use super::types::{ExecutionReceipt, PreparedCall, SubmissionHandle};
use crate::wallet::ConnectedWallet;
use alloy_network::ReceiptResponse;
use alloy_primitives::TxHash;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest as RpcTransactionRequest};
use async_trait::async_trait;
use eyre::Result;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use url::Url;

/// Dispatches contract calls to a JSON-RPC node over HTTP.
///
/// Submission signs locally with the connected wallet; confirmation is
/// tracked by polling `eth_getTransactionReceipt` and `eth_blockNumber`.
#[derive(Clone)]
pub struct AlloyDispatcher {
    rpc_url: Url,
    read_provider: DynProvider,
    poll_interval: Duration,
    confirmation_timeout: Option<Duration>,
}

impl AlloyDispatcher {
    pub fn new(rpc_url: Url, poll_interval: Duration, confirmation_timeout: Option<Duration>) -> Self {
        let read_provider = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();
        Self::with_read_provider(rpc_url, read_provider, poll_interval, confirmation_timeout)
    }

    /// Use `read_provider` for receipt and block-number polling; submissions still go to `rpc_url`
    pub fn with_read_provider(
        rpc_url: Url,
        read_provider: DynProvider,
        poll_interval: Duration,
        confirmation_timeout: Option<Duration>,
    ) -> Self {
        Self {
            rpc_url,
            read_provider,
            poll_interval,
            confirmation_timeout,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.rpc_url()?, config.poll_interval(), config.confirmation_timeout()))
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    fn build_transaction(wallet: &ConnectedWallet, call: &PreparedCall) -> RpcTransactionRequest {
        let mut tx = RpcTransactionRequest::default()
            .from(wallet.address)
            .to(call.target)
            .input(TransactionInput::new(call.calldata.clone()))
            .value(call.value);
        if let Some(gas_limit) = call.gas_limit {
            tx = tx.gas_limit(gas_limit);
        }
        tx
    }

    fn check_deadline(&self, tx_hash: TxHash, started: Instant) -> Result<(), ExecutionError> {
        match self.confirmation_timeout {
            Some(timeout) if started.elapsed() >= timeout => {
                warn!("Gave up waiting for {} after {:?}", tx_hash, timeout);
                Err(ExecutionError::ConfirmationTimeout { tx_hash, waited: started.elapsed() })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ContractDispatcher for AlloyDispatcher {
    async fn submit(&self, wallet: &ConnectedWallet, call: &PreparedCall) -> Result<SubmissionHandle, ExecutionError> {
        let provider = ProviderBuilder::new()
            .wallet(wallet.wallet.clone())
            .connect_http(self.rpc_url.clone());

        debug!(
            "Sending `{}` to {} ({} bytes calldata, value {})",
            call.method,
            call.target,
            call.calldata.len(),
            call.value
        );
        let pending = provider.send_transaction(Self::build_transaction(wallet, call)).await?;
        let tx_hash = *pending.tx_hash();
        info!("Broadcast {} for `{}`", tx_hash, call.method);

        Ok(SubmissionHandle {
            tx_hash,
            method: call.method.clone(),
        })
    }

    async fn wait_for_confirmation(
        &self,
        handle: &SubmissionHandle,
        confirmations: u64,
        on_depth: DepthReporter<'_>,
    ) -> Result<ExecutionReceipt, ExecutionError> {
        let started = Instant::now();
        let tx_hash = handle.tx_hash;

        loop {
            self.check_deadline(tx_hash, started)?;

            let receipt = self
                .read_provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ExecutionError::NetworkFailure(e.to_string()))?;

            if let Some(receipt) = receipt {
                if !receipt.status() {
                    return Err(ExecutionError::ExecutionReverted {
                        tx_hash: Some(tx_hash),
                        reason: None,
                    });
                }

                let depth = match receipt.block_number() {
                    Some(included_in) => {
                        let head = self
                            .read_provider
                            .get_block_number()
                            .await
                            .map_err(|e| ExecutionError::NetworkFailure(e.to_string()))?;
                        head.saturating_sub(included_in) + 1
                    }
                    None => 0,
                };
                on_depth(depth);

                if depth >= confirmations {
                    return Ok(ExecutionReceipt {
                        tx_hash,
                        block_number: receipt.block_number(),
                        gas_used: receipt.gas_used(),
                        confirmations: depth,
                    });
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, Bytes, U64, U256};
    use alloy_signer_local::PrivateKeySigner;
    use alloy_transport::mock::Asserter;
    use parking_lot::Mutex;
    use serde_json::json;

    fn dispatcher() -> AlloyDispatcher {
        AlloyDispatcher::from_config(&ExecutorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatcher_creation() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.rpc_url().as_str(), "http://127.0.0.1:8545/");
        assert_eq!(dispatcher.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_build_transaction() {
        let wallet = ConnectedWallet::from_signer(PrivateKeySigner::random(), 1);
        let call = PreparedCall {
            target: Address::repeat_byte(0xc0),
            method: "joinDAO".to_string(),
            calldata: Bytes::from(vec![1, 2, 3, 4]),
            value: U256::ZERO,
            gas_limit: Some(1_000_000),
        };

        let tx = AlloyDispatcher::build_transaction(&wallet, &call);
        assert_eq!(tx.from, Some(wallet.address));
        assert_eq!(tx.gas, Some(1_000_000));
        assert_eq!(tx.input.input(), Some(&call.calldata));
    }

    #[tokio::test]
    async fn test_deadline() {
        let dispatcher = AlloyDispatcher::new(
            Url::parse("http://127.0.0.1:8545").unwrap(),
            Duration::from_millis(10),
            Some(Duration::ZERO),
        );
        let result = dispatcher.check_deadline(TxHash::ZERO, Instant::now());
        assert!(matches!(result, Err(ExecutionError::ConfirmationTimeout { .. })));

        let patient = dispatcher_without_timeout();
        assert!(patient.check_deadline(TxHash::ZERO, Instant::now()).is_ok());
    }

    fn dispatcher_without_timeout() -> AlloyDispatcher {
        AlloyDispatcher::new(Url::parse("http://127.0.0.1:8545").unwrap(), Duration::from_millis(10), None)
    }

    const TX: TxHash = TxHash::repeat_byte(0x42);

    fn mocked(asserter: &Asserter, timeout: Option<Duration>) -> AlloyDispatcher {
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone()).erased();
        AlloyDispatcher::with_read_provider(
            Url::parse("http://127.0.0.1:8545").unwrap(),
            provider,
            Duration::from_secs(1),
            timeout,
        )
    }

    fn handle() -> SubmissionHandle {
        SubmissionHandle {
            tx_hash: TX,
            method: "contribute".to_string(),
        }
    }

    fn push_receipt(asserter: &Asserter, block: Option<u64>, success: bool) {
        let status = if success { "0x1" } else { "0x0" };
        asserter.push_success(&json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "blockHash": block.map(|_| B256::repeat_byte(0xbb)),
            "blockNumber": block.map(U64::from),
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": Address::repeat_byte(0x11),
            "to": Address::repeat_byte(0xc0),
            "contractAddress": null,
        }));
    }

    fn push_head(asserter: &Asserter, head: u64) {
        asserter.push_success(&U64::from(head));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_depth_reached() {
        let asserter = Asserter::new();
        push_receipt(&asserter, Some(100), true);
        push_head(&asserter, 101);
        push_receipt(&asserter, Some(100), true);
        push_head(&asserter, 102);

        let depths = Mutex::new(Vec::new());
        let on_depth = |depth: u64| depths.lock().push(depth);
        let receipt = mocked(&asserter, None)
            .wait_for_confirmation(&handle(), 3, &on_depth)
            .await
            .unwrap();

        assert_eq!(*depths.lock(), vec![2, 3]);
        assert_eq!(receipt.tx_hash, TX);
        assert_eq!(receipt.block_number, Some(100));
        assert_eq!(receipt.confirmations, 3);
        assert_eq!(receipt.gas_used, 21_000);
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_confirmations_returns_on_first_receipt() {
        let asserter = Asserter::new();
        asserter.push_success(&serde_json::Value::Null);
        push_receipt(&asserter, None, true);

        let receipt = mocked(&asserter, None)
            .wait_for_confirmation(&handle(), 0, &|_: u64| {})
            .await
            .unwrap();

        assert_eq!(receipt.confirmations, 0);
        assert_eq!(receipt.block_number, None);
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_receipt_is_reverted() {
        let asserter = Asserter::new();
        push_receipt(&asserter, Some(100), false);

        let result = mocked(&asserter, None).wait_for_confirmation(&handle(), 1, &|_: u64| {}).await;
        assert_eq!(
            result,
            Err(ExecutionError::ExecutionReverted {
                tx_hash: Some(TX),
                reason: None
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_while_polling() {
        let asserter = Asserter::new();
        for _ in 0..20 {
            asserter.push_success(&serde_json::Value::Null);
        }

        let result = mocked(&asserter, Some(Duration::from_secs(5)))
            .wait_for_confirmation(&handle(), 1, &|_: u64| {})
            .await;

        assert!(matches!(result, Err(ExecutionError::ConfirmationTimeout { tx_hash, .. }) if tx_hash == TX));
        // polled a few times before giving up
        let remaining = asserter.read_q().len();
        assert!(remaining > 0 && remaining < 20, "remaining responses: {}", remaining);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rpc_failure_is_network_failure() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("upstream unavailable");

        let result = mocked(&asserter, None).wait_for_confirmation(&handle(), 1, &|_: u64| {}).await;
        assert!(matches!(result, Err(ExecutionError::NetworkFailure(_))));
    }
}
