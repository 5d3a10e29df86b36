use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

use log::*;

use crate::crypto::{AesCbcCryptoProvider, AesEcbCryptoProvider, CryptoError, CryptoProvider, JweCryptoProvider};

/// The set of crypto providers known to this node, and the two defaults used for new data.
///
/// Identifiers and session data are rotated independently. Changing a default only affects what gets encrypted from
/// now on: data written under any provider that is still registered keeps decrypting, because the provider id travels
/// with the ciphertext.
#[derive(Clone)]
pub struct CryptoProviderRegistry {
    providers: HashMap<String, Arc<dyn CryptoProvider>>,
    id_provider: Arc<dyn CryptoProvider>,
    data_provider: Arc<dyn CryptoProvider>,
}

impl Debug for CryptoProviderRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CryptoProviderRegistry(providers: {:?}, id: {}, data: {})",
            self.provider_ids(),
            self.id_provider.id(),
            self.data_provider.id()
        )
    }
}

impl Default for CryptoProviderRegistry {
    fn default() -> Self {
        let cbc: Arc<dyn CryptoProvider> = Arc::new(AesCbcCryptoProvider);
        let jwe: Arc<dyn CryptoProvider> = Arc::new(JweCryptoProvider);
        let ecb: Arc<dyn CryptoProvider> = Arc::new(AesEcbCryptoProvider);
        let providers = [&cbc, &ecb, &jwe].into_iter().map(|p| (p.id().to_string(), Arc::clone(p))).collect();
        Self { providers, id_provider: cbc, data_provider: jwe }
    }
}

impl CryptoProviderRegistry {
    /// Creates a registry holding the built-in providers, with the given defaults for identifiers and session data.
    pub fn new(id_provider: &str, data_provider: &str) -> Result<Self, CryptoError> {
        Self::default().with_default_id_provider(id_provider)?.with_default_data_provider(data_provider)
    }

    /// Registers an additional provider. A provider with the same id is replaced.
    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        let id = provider.id().to_string();
        if self.providers.insert(id.clone(), provider).is_some() {
            warn!("🔐️ Crypto provider {id} was registered twice. The last registration wins.");
        }
        self
    }

    pub fn with_default_id_provider(mut self, id: &str) -> Result<Self, CryptoError> {
        self.id_provider = self.provider_by_id(id).ok_or_else(|| CryptoError::UnknownProvider(id.to_string()))?;
        Ok(self)
    }

    pub fn with_default_data_provider(mut self, id: &str) -> Result<Self, CryptoError> {
        self.data_provider = self.provider_by_id(id).ok_or_else(|| CryptoError::UnknownProvider(id.to_string()))?;
        Ok(self)
    }

    pub fn provider_by_id(&self, id: &str) -> Option<Arc<dyn CryptoProvider>> {
        self.providers.get(id).cloned()
    }

    /// The provider used for every newly issued identifier.
    pub fn default_id_provider(&self) -> Arc<dyn CryptoProvider> {
        Arc::clone(&self.id_provider)
    }

    /// The provider used for every newly written session blob.
    pub fn default_data_provider(&self) -> Arc<dyn CryptoProvider> {
        Arc::clone(&self.data_provider)
    }

    /// All registered provider ids, sorted.
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids = self.providers.keys().map(String::as_str).collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let registry = CryptoProviderRegistry::default();
        assert_eq!(registry.default_id_provider().id(), "aes-cbc-v1");
        assert_eq!(registry.default_data_provider().id(), "jwe-dir-a256gcm-v1");
        assert_eq!(registry.provider_ids(), vec!["aes-cbc-v1", "aes-ecb-v1", "jwe-dir-a256gcm-v1"]);
    }

    #[test]
    fn defaults_can_be_rotated_independently() {
        let registry = CryptoProviderRegistry::new("aes-ecb-v1", "aes-cbc-v1").unwrap();
        assert_eq!(registry.default_id_provider().id(), "aes-ecb-v1");
        assert_eq!(registry.default_data_provider().id(), "aes-cbc-v1");
        assert!(registry.provider_by_id("jwe-dir-a256gcm-v1").is_some());
    }

    #[test]
    fn unknown_defaults_are_rejected() {
        let err = CryptoProviderRegistry::new("rot13", "aes-cbc-v1").unwrap_err();
        assert_eq!(err, CryptoError::UnknownProvider("rot13".into()));
        assert!(CryptoProviderRegistry::default().provider_by_id("rot13").is_none());
    }
}
