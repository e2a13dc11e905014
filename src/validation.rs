use std::str::FromStr;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use solana_sdk::pubkey::Pubkey;
use crate::error::{Result, Error};

/// Checks that `address` is a base58 encoded 32-byte Solana public key.
pub fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(Error::ValidationError("Address cannot be empty".to_string()));
    }
    Pubkey::from_str(address)
        .map(|_| ())
        .map_err(|_| Error::ValidationError(format!("Invalid Solana address: {}", address)))
}

pub fn require_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ValidationError(format!("Missing required field: {}", name)));
    }
    Ok(())
}

/// Decodes the payload of a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .filter(|payload| !payload.is_empty())
        .ok_or_else(|| Error::ValidationError("Invalid base64 image format".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| Error::ValidationError(format!("Invalid base64 image data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("So11111111111111111111111111111111111111112").is_ok());
        assert!(validate_address("").is_err());
        assert!(validate_address("0OIl").is_err());
        assert!(validate_address("abc").is_err());
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(decode_data_url("data:image/png;base64,aGk=").unwrap(), b"hi".to_vec());
        assert!(decode_data_url("data:image/png;base64,").is_err());
        assert!(decode_data_url("aGk=").is_err());
        assert!(decode_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_require_field() {
        assert!(require_field("tokenName", "Fairly").is_ok());
        assert!(require_field("tokenName", "  ").is_err());
    }
}
