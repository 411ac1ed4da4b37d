// Client layers
pub mod contracts; // Contract bindings, method catalogue, input validation
pub mod execution; // Execution Layer: transaction lifecycle state machine
pub mod wallet; // Signing capability

// Common utilities and types
pub mod utils;

// Re-export key components from each layer
pub use contracts::{
    ClaimSubmission, ContractReadError, ContributionInput, CoreContract, GovernanceContract, GovernanceParams,
    MemberInfo, MethodCatalogue, ProposalDraft, ValidationError,
};
pub use execution::{
    AlloyDispatcher, ConfirmationPolicy, ContractDispatcher, ExecutionError, ExecutionReceipt, ExecutionStatus,
    ExecutorConfig, MockDispatcher, Progress, TransactionCallbacks, TransactionExecutor, TransactionExecutorBuilder,
    TransactionRequest, TransactionState,
};
pub use wallet::{ConnectedWallet, WalletConnector};
