use super::errors::ExecutionError;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A single contract write, as handed to the executor by the UI layer
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    /// Contract the call is dispatched to
    pub target: Address,
    /// Method name as listed in the method catalogue
    pub method: String,
    /// Positional arguments, in ABI order
    pub args: Vec<DynSolValue>,
    /// Native value to send along with the call
    pub value: Option<U256>,
    /// Explicit gas limit; the provider estimates one when absent
    pub gas_limit: Option<u64>,
}

impl TransactionRequest {
    pub fn new(target: Address, method: impl Into<String>, args: Vec<DynSolValue>) -> Self {
        Self {
            target,
            method: method.into(),
            args,
            value: None,
            gas_limit: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// A request after validation and ABI encoding, ready for the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub target: Address,
    pub method: String,
    pub calldata: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
}

/// Returned by the dispatcher once the network has accepted a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionHandle {
    pub tx_hash: TxHash,
    pub method: String,
}

/// Success payload of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Confirmation depth reached when the wait resolved
    pub confirmations: u64,
}

/// Percentage shown while a transaction is in flight.
///
/// Values are approximations of confirmation depth; only their ordering means anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(100);

    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Moves forward to `target`; never moves backwards. Returns whether it changed.
    pub fn advance_to(&mut self, target: Progress) -> bool {
        if target > *self {
            *self = target;
            true
        } else {
            false
        }
    }
}

/// Coarse lifecycle label, matching the status strings the UI renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Idle,
    Executing,
    Success,
    Error,
}

/// Full state of one executor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    Executing { progress: Progress },
    Success { receipt: ExecutionReceipt },
    /// `progress` is frozen at whatever the transaction reached before failing
    Error { error: ExecutionError, progress: Progress },
}

impl TransactionState {
    pub fn status(&self) -> ExecutionStatus {
        match self {
            Self::Idle => ExecutionStatus::Idle,
            Self::Executing { .. } => ExecutionStatus::Executing,
            Self::Success { .. } => ExecutionStatus::Success,
            Self::Error { .. } => ExecutionStatus::Error,
        }
    }

    pub fn progress(&self) -> Progress {
        match self {
            Self::Idle => Progress::ZERO,
            Self::Executing { progress } | Self::Error { progress, .. } => *progress,
            Self::Success { .. } => Progress::COMPLETE,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }

    pub fn is_executing(&self) -> bool {
        matches!(self, Self::Executing { .. })
    }

    pub fn receipt(&self) -> Option<&ExecutionReceipt> {
        match self {
            Self::Success { receipt } => Some(receipt),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}
