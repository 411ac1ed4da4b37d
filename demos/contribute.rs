//! Contribute to the DAO treasury and follow the transaction to confirmation.
//!
//! Reads `PRIVATE_KEY` and `CONTRIBUTION` (JSDAO, default 100) plus the usual
//! executor variables (`RPC_HTTP_URL`, `CHAIN_ID`, `CORE_ADDRESS`, ...).

use eyre::{Result, eyre};
use jobsecure_client::utils::init_tracing;
use jobsecure_client::{
    AlloyDispatcher, ContributionInput, CoreContract, ExecutorConfig, TransactionExecutorBuilder, WalletConnector,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExecutorConfig::from_env()?;
    init_tracing()?;

    if config.core_address.is_zero() {
        return Err(eyre!("CORE_ADDRESS is not set"));
    }

    let private_key = std::env::var("PRIVATE_KEY").map_err(|_| eyre!("PRIVATE_KEY is not set"))?;
    let wallet = WalletConnector::from_private_key(&private_key, config.chain_id)?;
    let dispatcher = Arc::new(AlloyDispatcher::from_config(&config)?);

    let executor = TransactionExecutorBuilder::new(wallet, dispatcher)
        .with_config(&config)
        .on_success(|receipt| info!("Contribution confirmed: {}", receipt.tx_hash))
        .on_error(|error| warn!("Contribution failed: {}", error))
        .build();

    let amount = std::env::var("CONTRIBUTION").unwrap_or_else(|_| "100".to_string());
    let request = CoreContract::new(config.core_address).contribute(&ContributionInput::new(amount))?;

    let mut updates = executor.subscribe();
    executor.execute(request)?;

    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        info!("{} ({}%)", state.status(), state.progress().value());
        if state.is_terminal() {
            break;
        }
    }

    let receipt = executor.wait_for_outcome().await?;
    info!(
        "Included in block {:?}, gas used {}",
        receipt.block_number, receipt.gas_used
    );
    Ok(())
}
