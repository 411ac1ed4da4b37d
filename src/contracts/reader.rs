use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest as RpcTransactionRequest};
use alloy_sol_types::SolCall;
use alloy_transport::{RpcError, TransportErrorKind};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ContractReadError {
    #[error("eth_call to {target} failed: {source}")]
    Rpc {
        target: Address,
        #[source]
        source: RpcError<TransportErrorKind>,
    },
    #[error("could not decode `{method}` result: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: alloy_sol_types::Error,
    },
}

/// Run a view call against `target` and decode its return values
pub async fn read_call<C, P>(provider: &P, target: Address, call: C) -> Result<C::Return, ContractReadError>
where
    C: SolCall,
    P: Provider,
{
    let tx = RpcTransactionRequest::default()
        .to(target)
        .input(TransactionInput::new(call.abi_encode().into()));

    let response = provider
        .call(tx)
        .await
        .map_err(|source| ContractReadError::Rpc { target, source })?;
    debug!("{} on {} returned {} bytes", C::SIGNATURE, target, response.len());

    C::abi_decode_returns(&response).map_err(|source| ContractReadError::Decode {
        method: C::SIGNATURE,
        source,
    })
}
