use aes::Aes256;
use ecb::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};

use crate::crypto::{
    key_derivation::derive_keys,
    tag::{sign, verify, TAG_LEN},
    CryptoError,
    CryptoProvider,
};

type Aes256EcbEnc = ecb::Encryptor<Aes256>;
type Aes256EcbDec = ecb::Decryptor<Aes256>;

const SALT: &[u8] = b"xs2a-crypto:aes-ecb-v1";
const BLOCK_LEN: usize = 16;

/// Legacy AES-256-ECB provider with PKCS#7 padding and an HMAC-SHA256 tag.
///
/// Encryption is deterministic: equal plaintexts under equal keys produce equal ciphertexts. It is kept so that
/// identifiers issued under it remain readable. Do not make it the default for new data.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesEcbCryptoProvider;

impl AesEcbCryptoProvider {
    pub const ID: &'static str = "aes-ecb-v1";
}

impl CryptoProvider for AesEcbCryptoProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let keys = derive_keys(key, SALT)?;
        let cipher =
            Aes256EcbEnc::new_from_slice(&keys.enc[..]).map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let mut result = cipher.encrypt_padded_vec_mut::<Pkcs7>(data);
        let tag = sign(&keys.mac[..], &[&result[..]])?;
        result.extend_from_slice(&tag);
        Ok(result)
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < BLOCK_LEN + TAG_LEN || (data.len() - TAG_LEN) % BLOCK_LEN != 0 {
            return Err(CryptoError::MalformedCiphertext(format!("unexpected length {}", data.len())));
        }
        let keys = derive_keys(key, SALT)?;
        let (ciphertext, tag) = data.split_at(data.len() - TAG_LEN);
        verify(&keys.mac[..], &[ciphertext], tag)?;
        let cipher =
            Aes256EcbDec::new_from_slice(&keys.enc[..]).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_for_all_key_lengths() {
        let provider = AesEcbCryptoProvider;
        for len in 3..=96 {
            let key = "x".repeat(len);
            let data = format!("payment-{len}_=_0123456789abcdef");
            let encrypted = provider.encrypt(data.as_bytes(), key.as_bytes()).unwrap();
            assert_eq!(provider.decrypt(&encrypted, key.as_bytes()).unwrap(), data.as_bytes());
        }
    }

    #[test]
    fn encryption_is_deterministic() {
        let provider = AesEcbCryptoProvider;
        let a = provider.encrypt(b"same", b"server-key").unwrap();
        let b = provider.encrypt(b"same", b"server-key").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let provider = AesEcbCryptoProvider;
        let encrypted = provider.encrypt(b"payload", b"right key").unwrap();
        assert_eq!(provider.decrypt(&encrypted, b"wrong key").unwrap_err(), CryptoError::AuthenticationFailed);
        assert!(provider.decrypt(b"short", b"right key").is_err());
    }
}
