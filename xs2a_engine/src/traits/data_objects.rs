use crate::{
    db_types::{AuthenticationObject, MessageErrorCode, PsuIdData, ResourceStatus, ScaApproach, ScaStatus},
    security::EncryptedData,
};

/// Everything a single SCA step changes, committed in one transaction.
#[derive(Debug, Clone)]
pub struct AuthorisationTransition {
    pub authorisation_id: String,
    /// The commit is refused with [`super::StoreError::VersionConflict`] unless the stored version still equals this.
    pub expected_version: i64,
    pub sca_status: ScaStatus,
    /// Changes from EMBEDDED to DECOUPLED when the PSU picks a decoupled SCA method.
    pub sca_approach: ScaApproach,
    pub psu: PsuIdData,
    pub chosen_sca_method: Option<AuthenticationObject>,
    pub available_sca_methods: Vec<AuthenticationObject>,
    pub error_code: Option<MessageErrorCode>,
    /// New status for the authorisation's parent resource, if it changes.
    pub resource_status: Option<ResourceStatus>,
    pub session_data: Option<SessionDataUpdate>,
}

#[derive(Debug, Clone)]
pub struct SessionDataUpdate {
    pub encrypted_id: String,
    pub data: EncryptedData,
}
