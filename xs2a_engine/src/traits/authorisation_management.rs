use crate::{
    db_types::{Authorisation, NewAuthorisation},
    traits::{AuthorisationTransition, StoreError},
};

/// Storage of SCA authorisations.
///
/// Every committed change bumps the record's `version`. [`AuthorisationManagement::commit_transition`] only succeeds
/// against the version the caller read, which serialises concurrent updates of the same authorisation across nodes.
#[allow(async_fn_in_trait)]
pub trait AuthorisationManagement {
    /// Fetches an authorisation by id. A stored status the engine does not know is reported as
    /// [`StoreError::UnknownScaStatus`].
    async fn fetch_authorisation(&self, authorisation_id: &str) -> Result<Option<Authorisation>, StoreError>;

    /// Stores a new authorisation in the initial status for its SCA approach, with version 0.
    async fn insert_authorisation(&self, authorisation: NewAuthorisation) -> Result<Authorisation, StoreError>;

    /// All authorisations started for the given consent or payment, oldest first.
    async fn fetch_authorisations_for_resource(&self, parent_id: &str) -> Result<Vec<Authorisation>, StoreError>;

    /// Applies the transition in a single atomic transaction:
    /// * the authorisation status, PSU data, SCA methods and error code are updated and the version is incremented,
    /// * the parent resource status is updated if the transition carries one,
    /// * the session data is replaced if the transition carries it.
    ///
    /// If the stored version is not `expected_version`, nothing is written and [`StoreError::VersionConflict`] is
    /// returned.
    async fn commit_transition(&self, transition: AuthorisationTransition) -> Result<Authorisation, StoreError>;
}
