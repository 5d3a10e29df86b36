use crate::{
    db_types::{AuthorisationKind, ResourceStatus},
    sca::{processor_service::ExemptionPoints, AuthorisationProcessorService},
};

/// Authorisation of account information consents.
///
/// With multilevel SCA the ASPSP reports `PARTIALLY_AUTHORISED` until the last PSU has authorised, and the consent
/// keeps that status.
#[derive(Debug, Clone, Copy, Default)]
pub struct AisAuthorisationProcessorService;

impl AuthorisationProcessorService for AisAuthorisationProcessorService {
    fn authorisation_kind(&self) -> AuthorisationKind {
        AuthorisationKind::Ais
    }

    fn exemption_points(&self) -> ExemptionPoints {
        ExemptionPoints::AUTHORISATION_CODE
    }

    fn finalised_resource_status(&self, reported: Option<ResourceStatus>) -> ResourceStatus {
        match reported {
            Some(ResourceStatus::PartiallyAuthorised) => ResourceStatus::PartiallyAuthorised,
            _ => ResourceStatus::Valid,
        }
    }
}
