use bs58;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid action: {0}. Must be 'add' or 'remove'")]
    InvalidAction(String),

    #[error("Invalid Solana address format: {0}")]
    InvalidSolanaAddress(String),

    #[error("Invalid transaction signature format: {0}")]
    InvalidSignature(String),
}

pub fn validate_action(action: &str) -> Result<(), ValidationError> {
    match action {
        "add" | "remove" => Ok(()),
        _ => Err(ValidationError::InvalidAction(action.to_string())),
    }
}

fn decoded_len(value: &str) -> Option<usize> {
    bs58::decode(value).into_vec().ok().map(|bytes| bytes.len())
}

pub fn validate_solana_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    // Solana addresses are 32 bytes
    match decoded_len(address) {
        Some(32) => Ok(()),
        _ => Err(ValidationError::InvalidSolanaAddress(address.to_string())),
    }
}

pub fn validate_signature(signature: &str) -> Result<(), ValidationError> {
    if signature.trim().is_empty() {
        return Err(ValidationError::MissingParameter("signature".to_string()));
    }

    // Ed25519 signatures are 64 bytes
    match decoded_len(signature) {
        Some(64) => Ok(()),
        _ => Err(ValidationError::InvalidSignature(signature.to_string())),
    }
}

pub fn validate_address_action(address: &str, action: &str) -> Result<(), ValidationError> {
    if action.trim().is_empty() {
        return Err(ValidationError::MissingParameter("action".to_string()));
    }

    validate_action(action)?;
    validate_solana_address(address)?;

    Ok(())
}
