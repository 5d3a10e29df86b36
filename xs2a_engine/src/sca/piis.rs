use crate::{
    db_types::{AuthorisationKind, ResourceStatus},
    sca::{processor_service::ExemptionPoints, AuthorisationProcessorService},
};

/// Authorisation of confirmation-of-funds consents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiisAuthorisationProcessorService;

impl AuthorisationProcessorService for PiisAuthorisationProcessorService {
    fn authorisation_kind(&self) -> AuthorisationKind {
        AuthorisationKind::Piis
    }

    fn exemption_points(&self) -> ExemptionPoints {
        ExemptionPoints::AUTHORISATION_CODE
    }

    fn finalised_resource_status(&self, _reported: Option<ResourceStatus>) -> ResourceStatus {
        ResourceStatus::Valid
    }
}
