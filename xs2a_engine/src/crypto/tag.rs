use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::crypto::CryptoError;

type HmacSha256 = Hmac<Sha256>;

pub const TAG_LEN: usize = 32;

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn sign(mac_key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key).map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    parts.iter().for_each(|p| mac.update(p));
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time check of `tag` against the HMAC-SHA256 of `parts`.
pub fn verify(mac_key: &[u8], parts: &[&[u8]], tag: &[u8]) -> Result<(), CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key).map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    parts.iter().for_each(|p| mac.update(p));
    mac.verify_slice(tag).map_err(|_| CryptoError::AuthenticationFailed)
}
