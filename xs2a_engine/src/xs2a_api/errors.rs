use thiserror::Error;

use crate::{
    db_types::{AuthorisationKind, ResourceStatus, ServiceType},
    traits::StoreError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceApiError {
    #[error("An encrypted identifier could not be issued for resource {0}")]
    IdentifierEncryptionFailed(String),
    #[error("The encrypted identifier is not valid")]
    InvalidIdentifier,
    #[error("The resource does not exist")]
    ResourceNotFound,
    #[error("Session data could not be encrypted")]
    SessionDataEncryptionFailed,
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorisationApiError {
    #[error("The encrypted identifier is not valid")]
    InvalidIdentifier,
    #[error("The resource does not exist")]
    ResourceNotFound,
    #[error("A {kind} authorisation cannot be started for a {service_type} resource")]
    KindMismatch { kind: AuthorisationKind, service_type: ServiceType },
    #[error("A {kind} authorisation cannot be started for a resource that is {status}")]
    ResourceClosed { kind: AuthorisationKind, status: ResourceStatus },
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}
