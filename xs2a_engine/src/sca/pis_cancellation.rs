use crate::{
    db_types::{AuthorisationKind, ResourceStatus, ScaStatus},
    sca::{
        context::ScaContext,
        errors::ProcessorError,
        objects::AuthorisationProcessorResponse,
        processor_service::ExemptionPoints,
        AuthorisationProcessorService,
    },
    spi::AuthorisationSpi,
};

/// Authorisation of payment cancellations.
///
/// Cancellations are never exempted from SCA, cannot be driven through the redirect `STARTED` status, and leave the
/// payment untouched if the PSU has no SCA methods. A finalised cancellation cancels the payment.
#[derive(Debug, Clone, Copy, Default)]
pub struct PisCancellationAuthorisationProcessorService;

impl AuthorisationProcessorService for PisCancellationAuthorisationProcessorService {
    fn authorisation_kind(&self) -> AuthorisationKind {
        AuthorisationKind::PisCancellation
    }

    fn exemption_points(&self) -> ExemptionPoints {
        ExemptionPoints::NONE
    }

    fn resource_status_without_sca_methods(&self) -> Option<ResourceStatus> {
        None
    }

    fn finalised_resource_status(&self, _reported: Option<ResourceStatus>) -> ResourceStatus {
        ResourceStatus::Cancelled
    }

    async fn do_sca_started<S: AuthorisationSpi>(
        &self,
        _ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        Err(ProcessorError::UnsupportedOperation { kind: self.authorisation_kind(), status: ScaStatus::Started })
    }
}
