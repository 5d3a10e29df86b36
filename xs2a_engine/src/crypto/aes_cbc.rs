use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::crypto::{
    key_derivation::derive_keys,
    tag::{sign, verify, TAG_LEN},
    CryptoError,
    CryptoProvider,
};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const SALT: &[u8] = b"xs2a-crypto:aes-cbc-v1";
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

/// AES-256-CBC with PKCS#7 padding, a random IV and an HMAC-SHA256 tag (encrypt-then-MAC).
///
/// Output layout: `iv (16) || ciphertext || tag (32)`. The tag covers the IV and the ciphertext. Two encryptions of
/// the same plaintext under the same key differ.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCbcCryptoProvider;

impl AesCbcCryptoProvider {
    pub const ID: &'static str = "aes-cbc-v1";
}

impl CryptoProvider for AesCbcCryptoProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let keys = derive_keys(key, SALT)?;
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let cipher = Aes256CbcEnc::new_from_slices(&keys.enc[..], &iv)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(data);
        let tag = sign(&keys.mac[..], &[&iv[..], &ciphertext[..]])?;
        let mut result = Vec::with_capacity(IV_LEN + ciphertext.len() + TAG_LEN);
        result.extend_from_slice(&iv);
        result.extend_from_slice(&ciphertext);
        result.extend_from_slice(&tag);
        Ok(result)
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < IV_LEN + BLOCK_LEN + TAG_LEN || (data.len() - IV_LEN - TAG_LEN) % BLOCK_LEN != 0 {
            return Err(CryptoError::MalformedCiphertext(format!("unexpected length {}", data.len())));
        }
        let keys = derive_keys(key, SALT)?;
        let (iv, rest) = data.split_at(IV_LEN);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);
        verify(&keys.mac[..], &[iv, ciphertext], tag)?;
        let cipher = Aes256CbcDec::new_from_slices(&keys.enc[..], iv)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_for_all_key_lengths() {
        let provider = AesCbcCryptoProvider;
        let data = b"consent-8c1f_=_Abcdefgh12345678";
        for len in 3..=96 {
            let key = "k".repeat(len);
            let encrypted = provider.encrypt(data, key.as_bytes()).unwrap();
            let decrypted = provider.decrypt(&encrypted, key.as_bytes()).unwrap();
            assert_eq!(decrypted, data, "key length {len}");
        }
    }

    #[test]
    fn encryption_is_randomised() {
        let provider = AesCbcCryptoProvider;
        let a = provider.encrypt(b"same", b"server-key").unwrap();
        let b = provider.encrypt(b"same", b"server-key").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let provider = AesCbcCryptoProvider;
        let encrypted = provider.encrypt(b"payload", b"right key").unwrap();
        let err = provider.decrypt(&encrypted, b"wrong key").unwrap_err();
        assert_eq!(err, CryptoError::AuthenticationFailed);
    }

    #[test]
    fn tampering_is_detected() {
        let provider = AesCbcCryptoProvider;
        let mut encrypted = provider.encrypt(b"payload", b"server-key").unwrap();
        encrypted[IV_LEN] ^= 0x01;
        assert_eq!(provider.decrypt(&encrypted, b"server-key").unwrap_err(), CryptoError::AuthenticationFailed);
        assert!(matches!(provider.decrypt(&encrypted[..20], b"server-key"), Err(CryptoError::MalformedCiphertext(_))));
    }
}
