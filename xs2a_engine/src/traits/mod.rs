//! # Store contract
//!
//! These traits define what a storage backend has to provide for the SCA engine. The engine ships with a SQLite
//! backend (`SqliteDatabase`), and the `test_utils` feature adds an in-memory one.
//!
//! * [`AuthorisationManagement`] stores authorisations, and commits SCA transitions with optimistic locking.
//! * [`ResourceManagement`] stores the consents and payments that authorisations belong to, and their encrypted
//!   session data.
//! * [`ConsentManagementDatabase`] combines the two.
mod authorisation_management;
mod consent_management_database;
mod data_objects;
mod errors;
mod resource_management;

pub use authorisation_management::AuthorisationManagement;
pub use consent_management_database::ConsentManagementDatabase;
pub use data_objects::{AuthorisationTransition, SessionDataUpdate};
pub use errors::StoreError;
pub use resource_management::ResourceManagement;
