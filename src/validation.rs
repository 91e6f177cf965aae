/// Input validation for account addresses
/// Purely syntactic: a well-formed address is accepted whether or not it exists on chain
use crate::types::AccountAddress;
use alloy::primitives::hex;

/// Length of an account address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field format: {field} - {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Input validation utilities
pub struct Validator;

impl Validator {
    /// Validate an address string and convert it to its canonical form.
    ///
    /// Accepts 40 hex digits with an optional `0x`/`0X` prefix. Letter case is
    /// ignored, so checksummed and lowercase spellings map to the same address;
    /// the EIP-55 checksum itself is not enforced.
    pub fn validate_address(input: &str) -> Result<AccountAddress, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError::MissingField {
                field: "address".to_string(),
            });
        }

        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(ValidationError::InvalidFormat {
                field: "address".to_string(),
                reason: format!(
                    "expected {} hex digits, got {} characters",
                    ADDRESS_LENGTH * 2,
                    digits.len()
                ),
            });
        }

        // with the length fixed, decoding only fails on a non-hex character
        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| ValidationError::InvalidFormat {
            field: "address".to_string(),
            reason: "contains non-hex characters".to_string(),
        })?;

        Ok(AccountAddress::from(bytes))
    }

    /// Cheap syntactic check without building the address
    pub fn is_valid_address(input: &str) -> bool {
        Self::validate_address(input).is_ok()
    }
}
