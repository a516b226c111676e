/*
 * Utility functions and helpers
 */

use crate::models::{ScannerError, Result};

const PUBKEY_LEN: usize = 32;
const MAX_BODY_LOG_LEN: usize = 512;

/// Checks that `address` is a base58 string encoding a 32-byte public key.
pub fn validate_address(address: &str) -> Result<String> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| ScannerError::ConfigError(format!("Invalid address {address}: {e}")))?;

    if bytes.len() != PUBKEY_LEN {
        return Err(ScannerError::ConfigError(format!(
            "Invalid address {address}: expected {PUBKEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(address.to_string())
}

/// Shortens upstream error bodies before they go into logs.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_LOG_LEN {
        return body.to_string();
    }
    let mut end = MAX_BODY_LOG_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_mints() {
        assert!(validate_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").is_ok());
        assert!(validate_address("So11111111111111111111111111111111111111112").is_ok());
    }

    #[test]
    fn rejects_non_base58_and_wrong_length() {
        // '0' and 'l' are outside the base58 alphabet
        assert!(validate_address("0xabc").is_err());
        assert!(validate_address("1111").is_err());
    }

    #[test]
    fn truncates_long_bodies_only() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(2000);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.len(), MAX_BODY_LOG_LEN + 3);
    }
}
