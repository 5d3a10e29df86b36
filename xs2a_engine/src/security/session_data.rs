use std::sync::Arc;

use log::*;
use xs2a_common::Secret;

use crate::{
    crypto::CryptoProviderRegistry,
    security::{IdentifierEncryptionService, SEPARATOR},
};

/// Session data as it is persisted: `[id_len: u8][provider id][ciphertext]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData(Vec<u8>);

impl EncryptedData {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The provider the blob was written with, if the framing is intact.
    pub fn provider_id(&self) -> Option<&str> {
        let (id, _) = split_frame(&self.0)?;
        Some(id)
    }
}

/// Plaintext session data. Wiped on drop.
#[derive(Debug, Clone)]
pub struct DecryptedData(Secret<Vec<u8>>);

impl DecryptedData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Secret::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.reveal()
    }
}

/// Encrypts and decrypts the opaque ASPSP session data attached to a consent or payment.
///
/// The key is the payload key embedded in the resource's encrypted identifier, so only a caller holding that
/// identifier can read the data. Session data is encrypted with the current default data provider, which is rotated
/// independently of the identifier provider. The provider id is stored in front of the ciphertext so that blobs written
/// before a rotation remain readable.
#[derive(Debug, Clone)]
pub struct ConsentDataCodec {
    identifiers: IdentifierEncryptionService,
    registry: Arc<CryptoProviderRegistry>,
}

impl ConsentDataCodec {
    pub fn new(identifiers: IdentifierEncryptionService, registry: Arc<CryptoProviderRegistry>) -> Self {
        Self { identifiers, registry }
    }

    pub fn identifiers(&self) -> &IdentifierEncryptionService {
        &self.identifiers
    }

    pub fn encrypt_session_data(&self, encrypted_id: &str, data: &[u8]) -> Option<EncryptedData> {
        let decrypted = self.identifiers.decrypt_identifier(encrypted_id)?;
        let provider = self.registry.default_data_provider();
        let id = provider.id().as_bytes();
        let Ok(id_len) = u8::try_from(id.len()) else {
            error!("🔐️ Crypto provider id {} is too long to frame session data", provider.id());
            return None;
        };
        let ciphertext = provider
            .encrypt(data, decrypted.payload_key.reveal().as_bytes())
            .map_err(|e| warn!("🔐️ Could not encrypt session data for {}. {e}", decrypted.internal_id))
            .ok()?;
        let mut framed = Vec::with_capacity(1 + id.len() + ciphertext.len());
        framed.push(id_len);
        framed.extend_from_slice(id);
        framed.extend_from_slice(&ciphertext);
        trace!("🔐️ Encrypted {} bytes of session data for {} using {}", data.len(), decrypted.internal_id, provider.id());
        Some(EncryptedData(framed))
    }

    pub fn decrypt_session_data(&self, encrypted_id: &str, data: &EncryptedData) -> Option<DecryptedData> {
        let decrypted = self.identifiers.decrypt_identifier(encrypted_id)?;
        let Some((provider_id, ciphertext)) = split_frame(&data.0) else {
            warn!("🔐️ Session data for {} is not framed correctly", decrypted.internal_id);
            return None;
        };
        let Some(provider) = self.registry.provider_by_id(provider_id) else {
            warn!("🔐️ Session data for {} was written with unknown provider '{provider_id}'", decrypted.internal_id);
            return None;
        };
        provider
            .decrypt(ciphertext, decrypted.payload_key.reveal().as_bytes())
            .map(DecryptedData::new)
            .map_err(|e| warn!("🔐️ Could not decrypt session data for {}. {e}", decrypted.internal_id))
            .ok()
    }
}

fn split_frame(data: &[u8]) -> Option<(&str, &[u8])> {
    let (&len, rest) = data.split_first()?;
    let len = usize::from(len);
    if len == 0 || rest.len() < len {
        return None;
    }
    let (id, ciphertext) = rest.split_at(len);
    let id = std::str::from_utf8(id).ok()?;
    if id.contains(SEPARATOR) {
        return None;
    }
    Some((id, ciphertext))
}

#[cfg(test)]
mod test {
    use super::*;

    fn codec(data_provider: &str) -> ConsentDataCodec {
        let registry = Arc::new(CryptoProviderRegistry::new("aes-cbc-v1", data_provider).unwrap());
        let ids = IdentifierEncryptionService::new(registry.clone(), Secret::new("server secret".to_string()));
        ConsentDataCodec::new(ids, registry)
    }

    #[test]
    fn round_trip() {
        let codec = codec("jwe-dir-a256gcm-v1");
        let id = codec.identifiers.encrypt_identifier("consent-1").unwrap();
        let encrypted = codec.encrypt_session_data(id.as_str(), b"aspsp-session-token").unwrap();
        assert_eq!(encrypted.provider_id(), Some("jwe-dir-a256gcm-v1"));
        let decrypted = codec.decrypt_session_data(id.as_str(), &encrypted).unwrap();
        assert_eq!(decrypted.as_bytes(), b"aspsp-session-token");
    }

    #[test]
    fn data_is_bound_to_its_identifier() {
        let codec = codec("aes-cbc-v1");
        let id1 = codec.identifiers.encrypt_identifier("consent-1").unwrap();
        let id2 = codec.identifiers.encrypt_identifier("consent-1").unwrap();
        let encrypted = codec.encrypt_session_data(id1.as_str(), b"secret").unwrap();
        assert!(codec.decrypt_session_data(id2.as_str(), &encrypted).is_none());
        assert!(codec.decrypt_session_data("garbage", &encrypted).is_none());
        assert!(codec.encrypt_session_data("garbage", b"secret").is_none());
    }

    #[test]
    fn data_written_before_rotation_still_decrypts() {
        let old = codec("aes-cbc-v1");
        let id = old.identifiers.encrypt_identifier("payment-9").unwrap();
        let encrypted = old.encrypt_session_data(id.as_str(), b"before").unwrap();

        let rotated = codec("jwe-dir-a256gcm-v1");
        assert_eq!(rotated.decrypt_session_data(id.as_str(), &encrypted).unwrap().as_bytes(), b"before");
        let rewritten = rotated.encrypt_session_data(id.as_str(), b"after").unwrap();
        assert_eq!(rewritten.provider_id(), Some("jwe-dir-a256gcm-v1"));
    }

    #[test]
    fn broken_frames_fail_closed() {
        let codec = codec("aes-cbc-v1");
        let id = codec.identifiers.encrypt_identifier("consent-1").unwrap();
        for bytes in [vec![], vec![0u8, 1, 2], vec![40u8, b'a'], b"\x05rot13xxxx".to_vec()] {
            assert!(codec.decrypt_session_data(id.as_str(), &EncryptedData::from_bytes(bytes)).is_none());
        }
    }
}
