//! # XS2A engine public API
//!
//! * [`resource_api`] registers consents and payments, and issues their encrypted identifiers.
//! * [`authorisation_api`] starts SCA authorisations for registered resources.
//!
//! Driving an authorisation through SCA is done by [`crate::sca::AuthorisationStateDispatcher`].
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits it needs:
//!
//! ```rust,ignore
//! use xs2a_engine::{AuthorisationApi, ResourceApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let resources = ResourceApi::new(db.clone(), codec.clone());
//! let (encrypted_id, _) = resources.register_resource("consent-1", ServiceType::Ais).await?;
//! let authorisations = AuthorisationApi::new(db, codec.identifiers().clone());
//! let auth = authorisations
//!     .start_authorisation(encrypted_id.as_str(), AuthorisationKind::Ais, ScaApproach::Embedded, psu)
//!     .await?;
//! ```
pub mod authorisation_api;
pub mod errors;
pub mod resource_api;
