//! Engine configuration, read from `XS2A_*` environment variables.
use std::{env, sync::Arc, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use thiserror::Error;
use xs2a_common::{
    helpers::{parse_boolean_flag, split_list},
    Secret,
};

use crate::{
    crypto::{AesCbcCryptoProvider, CryptoError, CryptoProviderRegistry, JweCryptoProvider},
    sca::{ScaSettings, DEFAULT_SPI_TIMEOUT},
    security::{ConsentDataCodec, IdentifierEncryptionService},
    xs2a_api::authorisation_api::DEFAULT_AUTHORISATION_TTL_MINUTES,
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/xs2a_store.db";
/// One year.
const MAX_AUTHORISATION_TTL_MINUTES: u64 = 525_600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVariable(&'static str),
    #[error("{name} has an invalid value '{value}'. {reason}")]
    InvalidValue { name: &'static str, value: String, reason: String },
    #[error("The crypto provider configuration is invalid. {0}")]
    CryptoProvider(#[from] CryptoError),
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// The server-wide secret that encrypted identifiers are issued under.
    pub server_key: Secret<String>,
    /// Previous server secrets. Identifiers issued under them can still be decrypted, but nothing new is encrypted
    /// with them.
    pub retired_server_keys: Vec<Secret<String>>,
    pub id_provider: String,
    pub data_provider: String,
    pub spi_timeout: StdDuration,
    /// How long a new authorisation stays valid.
    pub authorisation_ttl: Duration,
    pub exemptions_enabled: bool,
    pub database_url: String,
}

impl EngineConfig {
    pub fn new(server_key: Secret<String>) -> Self {
        Self {
            server_key,
            retired_server_keys: vec![],
            id_provider: AesCbcCryptoProvider::ID.to_string(),
            data_provider: JweCryptoProvider::ID.to_string(),
            spi_timeout: DEFAULT_SPI_TIMEOUT,
            authorisation_ttl: Duration::minutes(DEFAULT_AUTHORISATION_TTL_MINUTES),
            exemptions_enabled: true,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }

    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        let server_key = var("XS2A_SERVER_KEY").filter(|s| !s.is_empty()).ok_or_else(|| {
            error!("🪛️ XS2A_SERVER_KEY is not set. Encrypted identifiers cannot be issued without it.");
            ConfigError::MissingVariable("XS2A_SERVER_KEY")
        })?;
        let mut config = Self::new(Secret::new(server_key));
        config.retired_server_keys = var("XS2A_RETIRED_SERVER_KEYS")
            .map(|s| split_list(&s).into_iter().map(Secret::new).collect())
            .unwrap_or_default();
        if let Some(id) = var("XS2A_ID_CRYPTO_PROVIDER") {
            config.id_provider = id;
        }
        if let Some(id) = var("XS2A_DATA_CRYPTO_PROVIDER") {
            config.data_provider = id;
        }
        if let Some(secs) = var("XS2A_SPI_TIMEOUT") {
            config.spi_timeout = StdDuration::from_secs(parse_positive("XS2A_SPI_TIMEOUT", &secs)?);
        }
        if let Some(mins) = var("XS2A_AUTHORISATION_TTL") {
            let mins = parse_positive("XS2A_AUTHORISATION_TTL", &mins)?.min(MAX_AUTHORISATION_TTL_MINUTES);
            config.authorisation_ttl = Duration::minutes(mins as i64);
        }
        config.exemptions_enabled = parse_boolean_flag(var("XS2A_SCA_EXEMPTIONS_ENABLED"), true);
        config.database_url = var("XS2A_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        // Fails early on unknown provider ids
        config.registry()?;
        info!(
            "🪛️ Engine configured with id provider {}, data provider {}, {} retired server key(s)",
            config.id_provider,
            config.data_provider,
            config.retired_server_keys.len()
        );
        Ok(config)
    }

    pub fn registry(&self) -> Result<CryptoProviderRegistry, ConfigError> {
        Ok(CryptoProviderRegistry::new(&self.id_provider, &self.data_provider)?)
    }

    pub fn identifier_service(&self) -> Result<IdentifierEncryptionService, ConfigError> {
        Ok(self.identifier_service_with(Arc::new(self.registry()?)))
    }

    /// Builds the session data codec. It shares one provider registry with its identifier service.
    pub fn codec(&self) -> Result<ConsentDataCodec, ConfigError> {
        let registry = Arc::new(self.registry()?);
        let identifiers = self.identifier_service_with(registry.clone());
        Ok(ConsentDataCodec::new(identifiers, registry))
    }

    fn identifier_service_with(&self, registry: Arc<CryptoProviderRegistry>) -> IdentifierEncryptionService {
        IdentifierEncryptionService::new(registry, self.server_key.clone())
            .with_retired_server_keys(self.retired_server_keys.clone())
    }

    pub fn sca_settings(&self) -> ScaSettings {
        ScaSettings { spi_timeout: self.spi_timeout, exemptions_enabled: self.exemptions_enabled }
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue { name, value: value.into(), reason: "It must be positive".into() }),
        Ok(v) => Ok(v),
        Err(e) => {
            warn!("🪛️ {value} is not a valid value for {name}. {e}");
            Err(ConfigError::InvalidValue { name, value: value.into(), reason: e.to_string() })
        },
    }
}
