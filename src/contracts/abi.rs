use super::core::IJobSecureCore;
use super::governance::IJobSecureGovernance;
use crate::execution::{ExecutionError, PreparedCall, TransactionRequest};
use alloy_dyn_abi::JsonAbiExt;
use alloy_json_abi::{Function, StateMutability};
use alloy_sol_types::SolCall;
use std::collections::HashMap;

/// Write methods the executor knows how to encode, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MethodCatalogue {
    methods: HashMap<String, Function>,
}

impl MethodCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue of every JobSecure write method (core + governance)
    pub fn jobsecure() -> Self {
        let mut catalogue = Self::new();
        let signatures = [
            (IJobSecureCore::joinDAOCall::SIGNATURE, false),
            (IJobSecureCore::contributeCall::SIGNATURE, true),
            (IJobSecureCore::submitClaimCall::SIGNATURE, false),
            (IJobSecureCore::endClaimCall::SIGNATURE, false),
            (IJobSecureGovernance::submitProposalCall::SIGNATURE, false),
        ];
        for (signature, payable) in signatures {
            // signatures come from sol! and always parse
            if let Err(e) = catalogue.register_signature(signature, payable) {
                tracing::error!("Failed to register {}: {}", signature, e);
            }
        }
        catalogue
    }

    /// Register a method from a signature such as `contribute(uint256)`
    pub fn register_signature(&mut self, signature: &str, payable: bool) -> Result<(), ExecutionError> {
        let mut function = Function::parse(signature)
            .map_err(|e| ExecutionError::InvalidArguments(format!("bad signature `{}`: {}", signature, e)))?;
        function.state_mutability = if payable {
            StateMutability::Payable
        } else {
            StateMutability::NonPayable
        };
        self.register(function);
        Ok(())
    }

    pub fn register(&mut self, function: Function) {
        self.methods.insert(function.name.clone(), function);
    }

    pub fn get(&self, method: &str) -> Option<&Function> {
        self.methods.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Validate `request` against its ABI entry and encode the calldata.
    ///
    /// Never touches the network.
    pub fn prepare(&self, request: &TransactionRequest) -> Result<PreparedCall, ExecutionError> {
        if request.target.is_zero() {
            return Err(ExecutionError::InvalidArguments("target contract address is not set".to_string()));
        }

        let function = self
            .get(&request.method)
            .ok_or_else(|| ExecutionError::InvalidArguments(format!("unknown method `{}`", request.method)))?;

        if function.inputs.len() != request.args.len() {
            return Err(ExecutionError::InvalidArguments(format!(
                "`{}` takes {} argument(s), got {}",
                request.method,
                function.inputs.len(),
                request.args.len()
            )));
        }

        let value = request.value.unwrap_or_default();
        if !value.is_zero() && function.state_mutability != StateMutability::Payable {
            return Err(ExecutionError::InvalidArguments(format!(
                "`{}` is not payable but value {} was attached",
                request.method, value
            )));
        }

        let calldata = function.abi_encode_input(&request.args)?;

        Ok(PreparedCall {
            target: request.target,
            method: request.method.clone(),
            calldata: calldata.into(),
            value,
            gas_limit: request.gas_limit,
        })
    }
}
