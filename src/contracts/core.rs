use super::reader::{ContractReadError, read_call};
use super::validation::{ClaimSubmission, ContributionInput, ValidationError};
use crate::execution::TransactionRequest;
use crate::utils::constants::JOIN_DAO_GAS_LIMIT;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol! {
    /// Membership, contribution and claim entry points of the DAO core contract
    interface IJobSecureCore {
        function joinDAO(uint256 contributionAmount) external;
        function contribute(uint256 amount) external payable;
        function submitClaim() external;
        function endClaim() external;

        function members(address account) external view returns (
            bool isActive,
            uint256 totalContributions,
            uint256 lastContributionTime,
            uint256 benefitMultiplier,
            bool isUnemployed,
            uint256 claimStartTime,
            uint256 claimedWeeks
        );
    }
}

/// Membership record as stored by the core contract
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberInfo {
    pub is_active: bool,
    /// Base units (18 decimals)
    pub total_contributions: U256,
    /// Unix seconds
    pub last_contribution_time: U256,
    pub benefit_multiplier: U256,
    pub is_unemployed: bool,
    /// Unix seconds; zero when no claim is open
    pub claim_start_time: U256,
    pub claimed_weeks: U256,
}

impl MemberInfo {
    pub fn has_open_claim(&self) -> bool {
        self.is_active && self.is_unemployed
    }
}

impl From<IJobSecureCore::membersReturn> for MemberInfo {
    fn from(record: IJobSecureCore::membersReturn) -> Self {
        Self {
            is_active: record.isActive,
            total_contributions: record.totalContributions,
            last_contribution_time: record.lastContributionTime,
            benefit_multiplier: record.benefitMultiplier,
            is_unemployed: record.isUnemployed,
            claim_start_time: record.claimStartTime,
            claimed_weeks: record.claimedWeeks,
        }
    }
}

/// Builds validated requests against a deployed core contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreContract {
    address: Address,
}

impl CoreContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn join_dao(&self, contribution: &ContributionInput) -> Result<TransactionRequest, ValidationError> {
        let amount = contribution.validate()?;
        Ok(TransactionRequest::new(self.address, "joinDAO", vec![DynSolValue::Uint(amount, 256)])
            .with_gas_limit(JOIN_DAO_GAS_LIMIT))
    }

    /// The contribution amount is both the argument and the attached value
    pub fn contribute(&self, contribution: &ContributionInput) -> Result<TransactionRequest, ValidationError> {
        let amount = contribution.validate()?;
        Ok(TransactionRequest::new(self.address, "contribute", vec![DynSolValue::Uint(amount, 256)]).with_value(amount))
    }

    pub fn submit_claim(&self, claim: &ClaimSubmission) -> Result<TransactionRequest, ValidationError> {
        claim.validate()?;
        Ok(TransactionRequest::new(self.address, "submitClaim", vec![]))
    }

    pub fn end_claim(&self) -> TransactionRequest {
        TransactionRequest::new(self.address, "endClaim", vec![])
    }

    /// Membership and claim status of `account`
    pub async fn member<P: Provider>(&self, provider: &P, account: Address) -> Result<MemberInfo, ContractReadError> {
        let record = read_call(provider, self.address, IJobSecureCore::membersCall { account }).await?;
        Ok(record.into())
    }
}
