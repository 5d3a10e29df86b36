use crate::{
    db_types::{AuthorisationKind, PaymentAuthorisationType, ServiceType},
    sca::{
        errors::ProcessorError,
        AisAuthorisationProcessorService,
        AuthorisationProcessorService,
        PiisAuthorisationProcessorService,
        PisAuthorisationProcessorService,
        PisCancellationAuthorisationProcessorService,
    },
};

/// The processor service selected for one request.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedProcessor {
    Ais(AisAuthorisationProcessorService),
    Piis(PiisAuthorisationProcessorService),
    PisCreation(PisAuthorisationProcessorService),
    PisCancellation(PisCancellationAuthorisationProcessorService),
}

impl ResolvedProcessor {
    pub fn authorisation_kind(&self) -> AuthorisationKind {
        match self {
            ResolvedProcessor::Ais(p) => p.authorisation_kind(),
            ResolvedProcessor::Piis(p) => p.authorisation_kind(),
            ResolvedProcessor::PisCreation(p) => p.authorisation_kind(),
            ResolvedProcessor::PisCancellation(p) => p.authorisation_kind(),
        }
    }
}

/// Picks the processor service for an update, by service type and, for payments, by payment authorisation type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorisationProcessorServiceProvider {
    ais: AisAuthorisationProcessorService,
    piis: PiisAuthorisationProcessorService,
    pis: PisAuthorisationProcessorService,
    pis_cancellation: PisCancellationAuthorisationProcessorService,
}

impl AuthorisationProcessorServiceProvider {
    pub fn resolve(
        &self,
        service_type: ServiceType,
        payment_authorisation_type: Option<PaymentAuthorisationType>,
    ) -> Result<ResolvedProcessor, ProcessorError> {
        match (service_type, payment_authorisation_type) {
            (ServiceType::Ais, _) => Ok(ResolvedProcessor::Ais(self.ais)),
            (ServiceType::Piis, _) => Ok(ResolvedProcessor::Piis(self.piis)),
            (ServiceType::Pis, Some(PaymentAuthorisationType::Created)) => Ok(ResolvedProcessor::PisCreation(self.pis)),
            (ServiceType::Pis, Some(PaymentAuthorisationType::Cancelled)) => {
                Ok(ResolvedProcessor::PisCancellation(self.pis_cancellation))
            },
            (ServiceType::Pis, None) => Err(ProcessorError::MissingAuthorisationType(ServiceType::Pis)),
        }
    }

    /// Resolves the processor and checks that it is the one responsible for authorisations of kind `actual`.
    pub fn resolve_for(
        &self,
        service_type: ServiceType,
        payment_authorisation_type: Option<PaymentAuthorisationType>,
        actual: AuthorisationKind,
    ) -> Result<ResolvedProcessor, ProcessorError> {
        let processor = self.resolve(service_type, payment_authorisation_type)?;
        if processor.authorisation_kind() != actual {
            return Err(ProcessorError::AuthorisationKindMismatch { service_type, payment_authorisation_type, actual });
        }
        Ok(processor)
    }
}
