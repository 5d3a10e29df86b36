use aes_gcm::{
    aead::{Aead, Payload},
    Aes256Gcm,
    KeyInit,
    Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::{key_derivation::derive_keys, CryptoError, CryptoProvider};

const SALT: &[u8] = b"xs2a-crypto:jwe-dir-a256gcm-v1";
const NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;
const ALG: &str = "dir";
const ENC: &str = "A256GCM";

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
}

/// JWE compact serialisation with direct key agreement (`alg=dir`) and AES-256-GCM content encryption.
///
/// The output is the UTF-8 bytes of `header.encrypted_key.iv.ciphertext.tag`, each part base64url encoded without
/// padding. With `dir` the encrypted key part is empty. The encoded protected header is the additional authenticated
/// data, so any change to the header is detected on decryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct JweCryptoProvider;

impl JweCryptoProvider {
    pub const ID: &'static str = "jwe-dir-a256gcm-v1";

    fn cipher(key: &[u8]) -> Result<Aes256Gcm, CryptoError> {
        let keys = derive_keys(key, SALT)?;
        Aes256Gcm::new_from_slice(&keys.enc[..]).map_err(|e| CryptoError::KeyDerivation(e.to_string()))
    }
}

impl CryptoProvider for JweCryptoProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Self::cipher(key)?;
        let header = ProtectedHeader { alg: ALG.into(), enc: ENC.into() };
        let header = serde_json::to_vec(&header).map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let header = URL_SAFE_NO_PAD.encode(header);
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: data, aad: header.as_bytes() })
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - GCM_TAG_LEN);
        let compact = format!(
            "{header}..{}.{}.{}",
            URL_SAFE_NO_PAD.encode(nonce),
            URL_SAFE_NO_PAD.encode(ciphertext),
            URL_SAFE_NO_PAD.encode(tag)
        );
        Ok(compact.into_bytes())
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let compact = std::str::from_utf8(data).map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;
        let parts = compact.split('.').collect::<Vec<&str>>();
        let [header, encrypted_key, nonce, ciphertext, tag] = parts[..] else {
            return Err(CryptoError::MalformedCiphertext(format!("expected 5 JWE parts, found {}", parts.len())));
        };
        if !encrypted_key.is_empty() {
            return Err(CryptoError::MalformedCiphertext("direct encryption carries no encrypted key".into()));
        }
        let decode = |part: &str| {
            URL_SAFE_NO_PAD.decode(part).map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))
        };
        let protected: ProtectedHeader = serde_json::from_slice(&decode(header)?)
            .map_err(|e| CryptoError::MalformedCiphertext(format!("invalid protected header. {e}")))?;
        if protected.alg != ALG || protected.enc != ENC {
            return Err(CryptoError::MalformedCiphertext(format!(
                "unsupported algorithm {}/{}",
                protected.alg, protected.enc
            )));
        }
        let nonce = decode(nonce)?;
        if nonce.len() != NONCE_LEN {
            return Err(CryptoError::MalformedCiphertext(format!("invalid IV length {}", nonce.len())));
        }
        let mut sealed = decode(ciphertext)?;
        let tag = decode(tag)?;
        if tag.len() != GCM_TAG_LEN {
            return Err(CryptoError::MalformedCiphertext(format!("invalid tag length {}", tag.len())));
        }
        sealed.extend_from_slice(&tag);
        let cipher = Self::cipher(key)?;
        cipher
            .decrypt(Nonce::from_slice(&nonce), Payload { msg: &sealed, aad: header.as_bytes() })
            .map_err(|_| CryptoError::AuthenticationFailed)
    }
}
