use super::reader::{ContractReadError, read_call};
use super::validation::{ValidationError, validate_address};
use crate::execution::TransactionRequest;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol! {
    interface IJobSecureGovernance {
        function submitProposal(address target, uint256 value, bytes callData, string description) external returns (uint256 proposalId);

        function baseBenefitRate() external view returns (uint256);
        function minimumContribution() external view returns (uint256);
        function maxWeeklyBenefit() external view returns (uint256);
        function claimVerificationThreshold() external view returns (uint256);
        function getVotes(address account) external view returns (uint256);
    }
}

/// Current values of the DAO's tunable parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GovernanceParams {
    pub base_benefit_rate: U256,
    pub minimum_contribution: U256,
    pub max_weekly_benefit: U256,
    /// Votes needed to verify a claim
    pub claim_verification_threshold: U256,
}

/// Proposal form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub target: String,
    pub value: U256,
    pub calldata: Bytes,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernanceContract {
    address: Address,
}

impl GovernanceContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn submit_proposal(&self, draft: &ProposalDraft) -> Result<TransactionRequest, ValidationError> {
        let target = validate_address(&draft.target)?;
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        Ok(TransactionRequest::new(
            self.address,
            "submitProposal",
            vec![
                DynSolValue::Address(target),
                DynSolValue::Uint(draft.value, 256),
                DynSolValue::Bytes(draft.calldata.to_vec()),
                DynSolValue::String(description.to_string()),
            ],
        ))
    }

    pub async fn params<P: Provider>(&self, provider: &P) -> Result<GovernanceParams, ContractReadError> {
        Ok(GovernanceParams {
            base_benefit_rate: read_call(provider, self.address, IJobSecureGovernance::baseBenefitRateCall {}).await?,
            minimum_contribution: read_call(provider, self.address, IJobSecureGovernance::minimumContributionCall {})
                .await?,
            max_weekly_benefit: read_call(provider, self.address, IJobSecureGovernance::maxWeeklyBenefitCall {}).await?,
            claim_verification_threshold: read_call(
                provider,
                self.address,
                IJobSecureGovernance::claimVerificationThresholdCall {},
            )
            .await?,
        })
    }

    /// Voting power of `account`, in base units
    pub async fn voting_power<P: Provider>(&self, provider: &P, account: Address) -> Result<U256, ContractReadError> {
        read_call(provider, self.address, IJobSecureGovernance::getVotesCall { account }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::MethodCatalogue;
    use alloy_provider::ProviderBuilder;
    use alloy_sol_types::SolCall;
    use alloy_transport::mock::Asserter;

    fn push_uint(asserter: &Asserter, value: u64) {
        asserter.push_success(&Bytes::from(U256::from(value).to_be_bytes::<32>().to_vec()));
    }

    #[test]
    fn test_submit_proposal_encodes() {
        let governance = GovernanceContract::new(Address::repeat_byte(0x60));
        let draft = ProposalDraft {
            target: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            value: U256::ZERO,
            calldata: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            description: "Raise base benefit rate".to_string(),
        };

        let request = governance.submit_proposal(&draft).unwrap();
        let prepared = MethodCatalogue::jobsecure().prepare(&request).unwrap();
        let decoded = IJobSecureGovernance::submitProposalCall::abi_decode(&prepared.calldata).unwrap();

        assert_eq!(decoded.description, "Raise base benefit rate");
        assert_eq!(decoded.callData, draft.calldata);
    }

    #[test]
    fn test_submit_proposal_rejects_bad_target() {
        let governance = GovernanceContract::new(Address::repeat_byte(0x60));
        let draft = ProposalDraft {
            target: "treasury".to_string(),
            value: U256::ZERO,
            calldata: Bytes::new(),
            description: "x".to_string(),
        };
        assert!(matches!(
            governance.submit_proposal(&draft),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_params_read_in_order() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        for value in [150, 100, 2_000, 3] {
            push_uint(&asserter, value);
        }

        let params = GovernanceContract::new(Address::repeat_byte(0x60)).params(&provider).await.unwrap();
        assert_eq!(params.base_benefit_rate, U256::from(150));
        assert_eq!(params.minimum_contribution, U256::from(100));
        assert_eq!(params.max_weekly_benefit, U256::from(2_000));
        assert_eq!(params.claim_verification_threshold, U256::from(3));
    }

    #[tokio::test]
    async fn test_voting_power() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        push_uint(&asserter, 42);

        let governance = GovernanceContract::new(Address::repeat_byte(0x60));
        let votes = governance.voting_power(&provider, Address::repeat_byte(0x11)).await.unwrap();
        assert_eq!(votes, U256::from(42));

        asserter.push_failure_msg("header not found");
        assert!(governance.voting_power(&provider, Address::repeat_byte(0x11)).await.is_err());
    }
}
