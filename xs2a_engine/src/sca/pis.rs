use crate::{
    db_types::{AuthorisationKind, ResourceStatus},
    sca::{processor_service::ExemptionPoints, AuthorisationProcessorService},
};

/// Authorisation of payment initiations. The ASPSP may exempt a payment from SCA at any bank-facing step.
#[derive(Debug, Clone, Copy, Default)]
pub struct PisAuthorisationProcessorService;

impl AuthorisationProcessorService for PisAuthorisationProcessorService {
    fn authorisation_kind(&self) -> AuthorisationKind {
        AuthorisationKind::PisCreation
    }

    fn exemption_points(&self) -> ExemptionPoints {
        ExemptionPoints::ALL
    }

    fn finalised_resource_status(&self, _reported: Option<ResourceStatus>) -> ResourceStatus {
        ResourceStatus::Valid
    }
}
