/// Contracts Layer
///
/// JobSecure DAO interfaces, the catalogue of write methods the executor can
/// encode, view reads for membership and governance state, and the form
/// validation that runs before anything is submitted.
pub mod abi;
pub mod core;
pub mod governance;
pub mod reader;
pub mod validation;

pub use abi::MethodCatalogue;
pub use self::core::{CoreContract, IJobSecureCore, MemberInfo};
pub use governance::{GovernanceContract, GovernanceParams, IJobSecureGovernance, ProposalDraft};
pub use reader::{ContractReadError, read_call};
pub use validation::{ClaimSubmission, ContributionInput, ValidationError, validate_address, validate_contribution_amount};
