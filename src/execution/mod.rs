/// Execution Layer
///
/// This layer is responsible for:
/// - Turning a method name and arguments into signed contract calls
/// - Tracking each call from submission to a confirmed receipt
/// - Exposing the lifecycle as an observable state machine
pub mod alloy_dispatcher;
pub mod callbacks;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod mock_dispatcher;
pub mod transaction_executor;
pub mod types;


pub use alloy_dispatcher::AlloyDispatcher;
pub use callbacks::TransactionCallbacks;
pub use config::{ConfirmationPolicy, ExecutorConfig};
pub use dispatcher::{ContractDispatcher, DepthReporter};
pub use errors::ExecutionError;
pub use mock_dispatcher::MockDispatcher;
pub use transaction_executor::{ExecutionSettings, TransactionExecutor, TransactionExecutorBuilder};
pub use types::{
    ExecutionReceipt, ExecutionStatus, PreparedCall, Progress, SubmissionHandle, TransactionRequest, TransactionState,
};
