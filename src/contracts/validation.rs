use crate::utils::constants::{
    JSDAO_DECIMALS, MAX_CONTRIBUTION_JSDAO, MAX_MEMO_LENGTH, MIN_CONTRIBUTION_JSDAO, MIN_EMPLOYER_NAME_LENGTH,
};
use alloy_primitives::utils::parse_units;
use alloy_primitives::{Address, U256};
use regex::Regex;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

static PROOF_HASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{64}$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount must be positive")]
    NotPositive,
    #[error("Minimum contribution is {} JSDAO", MIN_CONTRIBUTION_JSDAO)]
    BelowMinimum,
    #[error("Maximum contribution exceeded")]
    AboveMaximum,
    #[error("Memo must be at most {} characters", MAX_MEMO_LENGTH)]
    MemoTooLong,
    #[error("Proof hash must be a 0x-prefixed 32-byte hex string")]
    InvalidProofHash,
    #[error("Employer name must be at least {} characters", MIN_EMPLOYER_NAME_LENGTH)]
    EmployerTooShort,
    #[error("Unemployment date cannot be in the future")]
    FutureDate,
    #[error("Proposal description is empty")]
    EmptyDescription,
}

/// Contribution form input, amount in JSDAO (decimal string, e.g. "150.25")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionInput {
    pub amount: String,
    pub memo: Option<String>,
}

impl ContributionInput {
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// Validates the input and returns the amount in base units
    pub fn validate(&self) -> Result<U256, ValidationError> {
        if let Some(memo) = &self.memo {
            if memo.chars().count() > MAX_MEMO_LENGTH {
                return Err(ValidationError::MemoTooLong);
            }
        }
        validate_contribution_amount(&self.amount)
    }
}

/// Claim form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSubmission {
    /// Unix timestamp (seconds) of the day employment ended
    pub unemployed_since: u64,
    pub last_employer: String,
    pub proof_hash: String,
}

impl ClaimSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(u64::MAX);
        if self.unemployed_since > now {
            return Err(ValidationError::FutureDate);
        }
        if self.last_employer.trim().chars().count() < MIN_EMPLOYER_NAME_LENGTH {
            return Err(ValidationError::EmployerTooShort);
        }
        if !PROOF_HASH_RE.is_match(&self.proof_hash) {
            return Err(ValidationError::InvalidProofHash);
        }
        Ok(())
    }
}

/// Parses a checksummed or lowercase hex address, refusing the zero address
pub fn validate_address(raw: &str) -> Result<Address, ValidationError> {
    let address = raw
        .trim()
        .parse::<Address>()
        .map_err(|_| ValidationError::InvalidAddress(raw.to_string()))?;
    if address.is_zero() {
        return Err(ValidationError::InvalidAddress(raw.to_string()));
    }
    Ok(address)
}

/// Converts a JSDAO decimal amount into base units, enforcing contribution bounds
pub fn validate_contribution_amount(amount: &str) -> Result<U256, ValidationError> {
    let amount = amount.trim();
    if amount.starts_with('-') {
        return Err(ValidationError::NotPositive);
    }
    let wei: U256 = parse_units(amount, JSDAO_DECIMALS)
        .map_err(|e| ValidationError::InvalidAmount(e.to_string()))?
        .get_absolute();

    if wei.is_zero() {
        return Err(ValidationError::NotPositive);
    }
    if wei < to_base_units(MIN_CONTRIBUTION_JSDAO) {
        return Err(ValidationError::BelowMinimum);
    }
    if wei > to_base_units(MAX_CONTRIBUTION_JSDAO) {
        return Err(ValidationError::AboveMaximum);
    }
    Ok(wei)
}

fn to_base_units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(JSDAO_DECIMALS))
}
