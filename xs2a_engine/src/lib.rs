//! XS2A Engine
//!
//! The XS2A engine drives the Strong Customer Authentication (SCA) of PSD2 consents and payments, and protects the
//! identifiers and bank session data that flow through it.
//!
//! The library is divided into these sections:
//! 1. The SCA state machine ([`mod@sca`]). [`AuthorisationStateDispatcher::process_update`] takes a TPP update for an
//!    authorisation, runs the single handler that owns its current SCA status, and commits the result. Bank-facing
//!    steps are delegated to an [`AuthorisationSpi`] implementation.
//! 2. Envelope encryption ([`mod@security`] and [`mod@crypto`]). Internal ids are wrapped together with a random payload
//!    key under the server secret. The payload key in turn protects the session data of the resource. Algorithms are
//!    pluggable and versioned, so they can be rotated without breaking identifiers already handed out.
//! 3. Storage ([`mod@traits`]). Backends implement the traits in this module. A SQLite backend is included.
//! 4. The public API ([`ResourceApi`], [`AuthorisationApi`]) for registering resources and starting authorisations.
pub mod config;
pub mod crypto;
pub mod db_types;
pub mod sca;
pub mod security;
pub mod spi;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;
mod xs2a_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::{ConfigError, EngineConfig};
pub use sca::{AuthorisationStateDispatcher, ProcessorError, ScaInput, ScaSettings};
pub use spi::AuthorisationSpi;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AuthorisationManagement, ConsentManagementDatabase, ResourceManagement, StoreError};
pub use xs2a_api::{
    authorisation_api::{AuthorisationApi, DEFAULT_AUTHORISATION_TTL_MINUTES},
    errors::{AuthorisationApiError, ResourceApiError},
    resource_api::ResourceApi,
};
