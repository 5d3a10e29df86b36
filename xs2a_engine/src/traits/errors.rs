use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Authorisation {0} does not exist")]
    AuthorisationNotFound(String),
    #[error("Authorisation {0} already exists")]
    AuthorisationAlreadyExists(String),
    #[error("Resource {0} does not exist")]
    ResourceNotFound(String),
    #[error("Resource {0} already exists")]
    ResourceAlreadyExists(String),
    #[error("Authorisation {authorisation_id} was modified concurrently. Expected version {expected_version}")]
    VersionConflict { authorisation_id: String, expected_version: i64 },
    #[error("The stored SCA status '{0}' is not known")]
    UnknownScaStatus(String),
    #[error("A stored record could not be read. {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::CorruptRecord(e.to_string())
    }
}
