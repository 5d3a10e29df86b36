//! # SCA authorisation engine
//!
//! An authorisation moves through the SCA statuses one TPP update at a time:
//!
//! ```text
//! RECEIVED ──> PSUIDENTIFIED ─┐
//!    │                        ├──> PSUAUTHENTICATED ──> SCAMETHODSELECTED ──> FINALISED
//! STARTED ────────────────────┘            (one method: straight to SCAMETHODSELECTED)
//!
//! any non-terminal status ──> FAILED | EXEMPTED
//! ```
//!
//! [`AuthorisationStateDispatcher::process_update`] is the entry point. It resolves the processor service for the
//! authorisation's family through the [`AuthorisationProcessorServiceProvider`], runs the one state handler that owns
//! the current status, and commits the result.
//!
//! Families differ in policy only:
//!
//! | Family           | Exemptions honoured                      | No SCA methods    | Resource when done               |
//! |------------------|------------------------------------------|-------------------|----------------------------------|
//! | AIS              | on the challenge request                 | consent REJECTED  | VALID, or PARTIALLY_AUTHORISED   |
//! | PIIS             | on the challenge request                 | consent REJECTED  | VALID                            |
//! | PIS creation     | on PSU login, method list and challenge  | payment REJECTED  | VALID                            |
//! | PIS cancellation | never                                    | payment unchanged | CANCELLED                        |
mod ais;
mod context;
mod dispatcher;
mod errors;
mod locks;
mod objects;
mod piis;
mod pis;
mod pis_cancellation;
pub mod processor_service;
mod service_provider;
mod session;
pub mod state_handlers;
pub mod transitions;

pub use ais::AisAuthorisationProcessorService;
pub use context::{ScaContext, ScaSettings, DEFAULT_SPI_TIMEOUT};
pub use dispatcher::AuthorisationStateDispatcher;
pub use errors::ProcessorError;
pub use locks::AuthorisationLocks;
pub use objects::{AuthorisationProcessorRequest, AuthorisationProcessorResponse, NextStep, ScaInput};
pub use piis::PiisAuthorisationProcessorService;
pub use pis::PisAuthorisationProcessorService;
pub use pis_cancellation::PisCancellationAuthorisationProcessorService;
pub use processor_service::{AuthorisationProcessorService, ExemptionPoints};
pub use service_provider::{AuthorisationProcessorServiceProvider, ResolvedProcessor};
pub use session::{SessionDataProvider, SessionDataUnavailable};
