//! Byte-level helpers for decoding Anchor program accounts.

use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};

pub use wide::{U256, U512};

mod wide {
    uint::construct_uint! {
        pub struct U256(4);
    }

    uint::construct_uint! {
        pub struct U512(8);
    }
}

/// First 8 bytes of `sha256("account:<name>")`, the Anchor account tag.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("account:{}", name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

pub fn check_discriminator(data: &[u8], name: &str, address: &str) -> Result<()> {
    if data.len() < 8 || data[..8] != account_discriminator(name) {
        return Err(Error::AccountDiscriminatorMismatch(format!("{} ({})", address, name)));
    }
    Ok(())
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset + len).ok_or_else(|| {
        Error::ParseError(format!(
            "Account data too short: need {} bytes at offset {}, have {}",
            len,
            offset,
            data.len()
        ))
    })
}

pub fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice(data, offset, 8)?);
    Ok(u64::from_le_bytes(buf))
}

pub fn read_u128(data: &[u8], offset: usize) -> Result<u128> {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(slice(data, offset, 16)?);
    Ok(u128::from_le_bytes(buf))
}

pub fn read_u256(data: &[u8], offset: usize) -> Result<U256> {
    Ok(U256::from_little_endian(slice(data, offset, 32)?))
}

pub fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey> {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(slice(data, offset, 32)?);
    Ok(Pubkey::new_from_array(buf))
}
