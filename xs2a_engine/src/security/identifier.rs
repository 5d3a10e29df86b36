use std::{fmt::Display, sync::Arc};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use xs2a_common::Secret;
use zeroize::Zeroizing;

use crate::crypto::CryptoProviderRegistry;

/// Joins the fields of an identifier, both inside the ciphertext and in front of the provider id.
pub const SEPARATOR: &str = "_=_";
pub const PAYLOAD_KEY_LEN: usize = 16;

/// The opaque identifier of a consent or payment as seen by the TPP.
///
/// Wire format: `base64url(encrypt(internal_id || "_=_" || payload_key, server_key)) || "_=_" || provider_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedIdentifier(String);

impl EncryptedIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id of the provider this identifier was issued under.
    pub fn provider_id(&self) -> Option<&str> {
        self.0.split_once(SEPARATOR).map(|(_, id)| id)
    }
}

impl Display for EncryptedIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EncryptedIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EncryptedIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The contents of an [`EncryptedIdentifier`].
#[derive(Debug, Clone)]
pub struct DecryptedIdentifier {
    pub internal_id: String,
    /// The per-resource key that protects the resource's session data. Never logged.
    pub payload_key: Secret<String>,
}

/// Issues and opens the encrypted identifiers handed out to TPPs.
///
/// Neither operation returns an error. Whatever goes wrong (an unknown provider id, a malformed or tampered
/// identifier, a wrong server key) is logged and reported as `None`, so callers cannot tell the failure modes apart.
#[derive(Clone)]
pub struct IdentifierEncryptionService {
    registry: Arc<CryptoProviderRegistry>,
    server_key: Secret<String>,
    retired_server_keys: Vec<Secret<String>>,
}

impl std::fmt::Debug for IdentifierEncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentifierEncryptionService({:?}, {} retired keys)", self.registry, self.retired_server_keys.len())
    }
}

impl IdentifierEncryptionService {
    pub fn new(registry: Arc<CryptoProviderRegistry>, server_key: Secret<String>) -> Self {
        Self { registry, server_key, retired_server_keys: vec![] }
    }

    /// Server keys that are no longer used for encryption, but may still have issued live identifiers. They are tried
    /// in order after the current key.
    pub fn with_retired_server_keys(mut self, keys: Vec<Secret<String>>) -> Self {
        self.retired_server_keys = keys;
        self
    }

    pub fn registry(&self) -> &CryptoProviderRegistry {
        &self.registry
    }

    /// Issues a new identifier for `internal_id`, with a fresh random payload key, under the current default
    /// identifier provider.
    pub fn encrypt_identifier(&self, internal_id: &str) -> Option<EncryptedIdentifier> {
        if internal_id.is_empty() || internal_id.contains(SEPARATOR) {
            warn!("🔐️ Refusing to encrypt identifier. Internal ids must be non-empty and must not contain {SEPARATOR}");
            return None;
        }
        let payload_key = generate_payload_key();
        let plaintext = Zeroizing::new(format!("{internal_id}{SEPARATOR}{}", payload_key.reveal()));
        let provider = self.registry.default_id_provider();
        match provider.encrypt(plaintext.as_bytes(), self.server_key.reveal().as_bytes()) {
            Ok(ciphertext) => {
                trace!("🔐️ Issued identifier for {internal_id} using {}", provider.id());
                let encoded = URL_SAFE_NO_PAD.encode(ciphertext);
                Some(EncryptedIdentifier(format!("{encoded}{SEPARATOR}{}", provider.id())))
            },
            Err(e) => {
                error!("🔐️ Could not encrypt identifier for {internal_id}. {e}");
                None
            },
        }
    }

    /// Opens an identifier issued by [`Self::encrypt_identifier`], under whichever provider issued it.
    pub fn decrypt_identifier(&self, encrypted_id: &str) -> Option<DecryptedIdentifier> {
        let parts = encrypted_id.split(SEPARATOR).collect::<Vec<&str>>();
        let [encoded, provider_id] = parts[..] else {
            debug!("🔐️ Identifier has {} fields instead of 2", parts.len());
            return None;
        };
        let Some(provider) = self.registry.provider_by_id(provider_id) else {
            warn!("🔐️ Identifier was issued under unknown crypto provider '{provider_id}'");
            return None;
        };
        let ciphertext = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| debug!("🔐️ Identifier is not valid base64. {e}"))
            .ok()?;
        let plaintext = std::iter::once(&self.server_key)
            .chain(self.retired_server_keys.iter())
            .enumerate()
            .find_map(|(i, key)| match provider.decrypt(&ciphertext, key.reveal().as_bytes()) {
                Ok(plaintext) => {
                    if i > 0 {
                        info!("🔐️ Identifier opened with retired server key #{i}");
                    }
                    Some(Zeroizing::new(plaintext))
                },
                Err(_) => None,
            });
        let Some(plaintext) = plaintext else {
            debug!("🔐️ No server key opens this identifier");
            return None;
        };
        let plaintext = std::str::from_utf8(&plaintext).map_err(|_| debug!("🔐️ Identifier is not UTF-8")).ok()?;
        let fields = plaintext.split(SEPARATOR).collect::<Vec<&str>>();
        match fields[..] {
            [internal_id, payload_key] if !internal_id.is_empty() && !payload_key.is_empty() => {
                Some(DecryptedIdentifier {
                    internal_id: internal_id.to_string(),
                    payload_key: Secret::new(payload_key.to_string()),
                })
            },
            _ => {
                debug!("🔐️ Decrypted identifier has {} fields instead of 2", fields.len());
                None
            },
        }
    }
}

fn generate_payload_key() -> Secret<String> {
    let key = thread_rng().sample_iter(&Alphanumeric).take(PAYLOAD_KEY_LEN).map(char::from).collect::<String>();
    Secret::new(key)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{AesEcbCryptoProvider, CryptoProvider};

    fn service(id_provider: &str) -> IdentifierEncryptionService {
        let registry = CryptoProviderRegistry::new(id_provider, "jwe-dir-a256gcm-v1").unwrap();
        IdentifierEncryptionService::new(Arc::new(registry), Secret::new("the server secret".to_string()))
    }

    #[test]
    fn payload_keys_are_alphanumeric() {
        let key = generate_payload_key();
        assert_eq!(key.reveal().len(), PAYLOAD_KEY_LEN);
        assert!(key.reveal().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn round_trip() {
        let service = service("aes-cbc-v1");
        let encrypted = service.encrypt_identifier("consent-42").unwrap();
        assert_eq!(encrypted.provider_id(), Some("aes-cbc-v1"));
        let decrypted = service.decrypt_identifier(encrypted.as_str()).unwrap();
        assert_eq!(decrypted.internal_id, "consent-42");
        assert_eq!(decrypted.payload_key.reveal().len(), PAYLOAD_KEY_LEN);
        assert!(!format!("{decrypted:?}").contains(decrypted.payload_key.reveal().as_str()));
    }

    #[test]
    fn each_identifier_gets_its_own_payload_key() {
        let service = service("aes-ecb-v1");
        let a = service.encrypt_identifier("payment-1").unwrap();
        let b = service.encrypt_identifier("payment-1").unwrap();
        assert_ne!(a, b);
        let a = service.decrypt_identifier(a.as_str()).unwrap();
        let b = service.decrypt_identifier(b.as_str()).unwrap();
        assert_ne!(a.payload_key.reveal(), b.payload_key.reveal());
    }

    #[test]
    fn separators_in_internal_ids_are_refused() {
        let service = service("aes-cbc-v1");
        assert!(service.encrypt_identifier("bad_=_id").is_none());
        assert!(service.encrypt_identifier("").is_none());
    }

    #[test]
    fn malformed_identifiers_fail_closed() {
        let service = service("aes-cbc-v1");
        let encrypted = service.encrypt_identifier("consent-42").unwrap();
        let (body, _) = encrypted.as_str().split_once(SEPARATOR).unwrap();
        assert!(service.decrypt_identifier(body).is_none());
        assert!(service.decrypt_identifier(&format!("{body}_=_rot13")).is_none());
        assert!(service.decrypt_identifier(&format!("{}_=_extra", encrypted.as_str())).is_none());
        assert!(service.decrypt_identifier("%%%_=_aes-cbc-v1").is_none());
    }

    #[test]
    fn wrong_field_count_inside_ciphertext_fails() {
        let service = service("aes-ecb-v1");
        let ciphertext = AesEcbCryptoProvider.encrypt(b"only-one-field", b"the server secret").unwrap();
        let forged = format!("{}_=_aes-ecb-v1", URL_SAFE_NO_PAD.encode(ciphertext));
        assert!(service.decrypt_identifier(&forged).is_none());
        let ciphertext = AesEcbCryptoProvider.encrypt(b"a_=_b_=_c", b"the server secret").unwrap();
        let forged = format!("{}_=_aes-ecb-v1", URL_SAFE_NO_PAD.encode(ciphertext));
        assert!(service.decrypt_identifier(&forged).is_none());
    }

    #[test]
    fn retired_keys_still_open_old_identifiers() {
        let registry = Arc::new(CryptoProviderRegistry::default());
        let old = IdentifierEncryptionService::new(registry.clone(), Secret::new("old secret".to_string()));
        let encrypted = old.encrypt_identifier("consent-7").unwrap();

        let rotated = IdentifierEncryptionService::new(registry.clone(), Secret::new("new secret".to_string()));
        assert!(rotated.decrypt_identifier(encrypted.as_str()).is_none());

        let rotated = rotated.with_retired_server_keys(vec![Secret::new("old secret".to_string())]);
        assert_eq!(rotated.decrypt_identifier(encrypted.as_str()).unwrap().internal_id, "consent-7");
    }
}
