use thiserror::Error;

use crate::{
    db_types::{AuthorisationKind, PaymentAuthorisationType, ScaStatus, ServiceType},
    traits::StoreError,
};

/// Precondition violations and store failures.
///
/// Business outcomes (wrong password, no SCA methods, ASPSP errors) are not errors. They end up in the authorisation
/// as a `FAILED` status and an error code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error("A payment authorisation type is required to process {0} authorisations")]
    MissingAuthorisationType(ServiceType),
    #[error("The update is for {service_type} ({payment_authorisation_type:?}) but the authorisation is {actual}")]
    AuthorisationKindMismatch {
        service_type: ServiceType,
        payment_authorisation_type: Option<PaymentAuthorisationType>,
        actual: AuthorisationKind,
    },
    #[error("The stored SCA status '{0}' is not known")]
    UnknownScaStatus(String),
    #[error("{kind} authorisations cannot be processed in status {status}")]
    UnsupportedOperation { kind: AuthorisationKind, status: ScaStatus },
    #[error("Transition from {from} to {to} is not allowed")]
    UnsupportedTransition { from: ScaStatus, to: ScaStatus },
    #[error("The {handler} handler was invoked for an authorisation in status {actual}")]
    HandlerStatusMismatch { handler: ScaStatus, actual: ScaStatus },
    #[error("Authorisation {0} does not exist")]
    AuthorisationNotFound(String),
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ProcessorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownScaStatus(s) => ProcessorError::UnknownScaStatus(s),
            StoreError::AuthorisationNotFound(id) => ProcessorError::AuthorisationNotFound(id),
            e => ProcessorError::Store(e),
        }
    }
}
