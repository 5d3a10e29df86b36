//! Deterministic key derivation shared by all the built-in providers.
//!
//! Callers hand providers passwords of arbitrary length (the 16-character payload keys, or operator-chosen server
//! secrets). These are stretched into fixed-size AES-256 and HMAC-SHA256 keys with HKDF-SHA256:
//!
//! * `ikm` is the raw key bytes,
//! * `salt` is a constant unique to each provider, so the same password yields unrelated keys per algorithm,
//! * `info` is `"xs2a:enc"` for the cipher key and `"xs2a:mac"` for the authentication key.
//!
//! HKDF is not a password-hardening function. The inputs are either random (payload keys) or operator secrets with
//! enough entropy, so no work factor is applied.
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::CryptoError;

pub const KEY_LEN: usize = 32;
/// Keys shorter than this are rejected outright.
pub const MIN_KEY_LEN: usize = 3;

const ENC_INFO: &[u8] = b"xs2a:enc";
const MAC_INFO: &[u8] = b"xs2a:mac";

pub struct DerivedKeys {
    pub enc: Zeroizing<[u8; KEY_LEN]>,
    pub mac: Zeroizing<[u8; KEY_LEN]>,
}

pub fn derive_keys(key: &[u8], salt: &[u8]) -> Result<DerivedKeys, CryptoError> {
    if key.len() < MIN_KEY_LEN {
        return Err(CryptoError::KeyTooShort(MIN_KEY_LEN));
    }
    let hk = Hkdf::<Sha256>::new(Some(salt), key);
    let mut enc = Zeroizing::new([0u8; KEY_LEN]);
    let mut mac = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(ENC_INFO, enc.as_mut()).map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    hk.expand(MAC_INFO, mac.as_mut()).map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(DerivedKeys { enc, mac })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_keys(b"some secret", b"salt").unwrap();
        let b = derive_keys(b"some secret", b"salt").unwrap();
        assert_eq!(*a.enc, *b.enc);
        assert_eq!(*a.mac, *b.mac);
        assert_ne!(*a.enc, *a.mac);
    }

    #[test]
    fn salt_separates_providers() {
        let a = derive_keys(b"some secret", b"salt-1").unwrap();
        let b = derive_keys(b"some secret", b"salt-2").unwrap();
        assert_ne!(*a.enc, *b.enc);
    }

    #[test]
    fn short_keys_are_rejected() {
        assert_eq!(derive_keys(b"ab", b"salt").err(), Some(CryptoError::KeyTooShort(3)));
        assert!(derive_keys(b"abc", b"salt").is_ok());
    }
}
