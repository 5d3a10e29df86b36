use serde::Serialize;
use xs2a_common::Secret;

use crate::db_types::{
    AuthenticationObject,
    Authorisation,
    AuthorisationKind,
    ChallengeData,
    MessageErrorCode,
    ParentResource,
    PaymentAuthorisationType,
    PsuIdData,
    ResourceStatus,
    ScaApproach,
    ScaStatus,
    ServiceType,
};

/// An update to an authorisation, as sent by the TPP.
///
/// Which fields are needed depends on the status the authorisation is in: a password to authenticate the PSU, a
/// method id to select an SCA method, or the OTP to finalise it.
#[derive(Debug, Clone)]
pub struct ScaInput {
    pub service_type: ServiceType,
    /// Required for payments, to tell initiation and cancellation authorisations apart.
    pub payment_authorisation_type: Option<PaymentAuthorisationType>,
    pub psu: Option<PsuIdData>,
    pub password: Option<Secret<String>>,
    pub authentication_method_id: Option<String>,
    pub sca_authentication_data: Option<Secret<String>>,
}

impl ScaInput {
    pub fn new(service_type: ServiceType, payment_authorisation_type: Option<PaymentAuthorisationType>) -> Self {
        Self {
            service_type,
            payment_authorisation_type,
            psu: None,
            password: None,
            authentication_method_id: None,
            sca_authentication_data: None,
        }
    }

    /// An empty update addressed at the given kind of authorisation.
    pub fn for_kind(kind: AuthorisationKind) -> Self {
        Self::new(kind.service_type(), kind.payment_authorisation_type())
    }

    pub fn with_psu(mut self, psu: PsuIdData) -> Self {
        self.psu = Some(psu);
        self
    }

    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(Secret::new(password.into()));
        self
    }

    pub fn with_authentication_method<S: Into<String>>(mut self, method_id: S) -> Self {
        self.authentication_method_id = Some(method_id.into());
        self
    }

    pub fn with_sca_authentication_data<S: Into<String>>(mut self, otp: S) -> Self {
        self.sca_authentication_data = Some(Secret::new(otp.into()));
        self
    }

    /// True when the update identifies the PSU without authenticating them.
    pub fn is_psu_identification(&self) -> bool {
        self.password.is_none() && self.psu.as_ref().is_some_and(|p| !p.is_empty())
    }
}

/// A single step of the SCA state machine: the current state, and the update to apply to it.
#[derive(Debug, Clone)]
pub struct AuthorisationProcessorRequest {
    pub sca_status: ScaStatus,
    pub authorisation: Authorisation,
    pub resource: ParentResource,
    pub input: ScaInput,
}

impl AuthorisationProcessorRequest {
    pub fn new(authorisation: Authorisation, resource: ParentResource, input: ScaInput) -> Self {
        Self { sca_status: authorisation.sca_status, authorisation, resource, input }
    }
}

/// What the TPP should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NextStep {
    SelectAuthenticationMethod,
    AuthoriseTransaction,
    /// Decoupled SCA: the PSU confirms in the ASPSP's app. The TPP polls the status and sends no OTP.
    AuthoriseInBankApp,
}

/// The new state of an authorisation after one SCA step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorisationProcessorResponse {
    pub sca_status: ScaStatus,
    pub authorisation_id: String,
    pub resource_id: String,
    pub sca_approach: ScaApproach,
    pub psu: PsuIdData,
    pub chosen_sca_method: Option<AuthenticationObject>,
    pub available_sca_methods: Vec<AuthenticationObject>,
    pub challenge_data: Option<ChallengeData>,
    pub psu_message: Option<String>,
    pub error_code: Option<MessageErrorCode>,
    pub next_step: Option<NextStep>,
    /// The new status of the parent resource, if this step changes it.
    pub resource_status: Option<ResourceStatus>,
}

impl AuthorisationProcessorResponse {
    /// A response that leaves the authorisation exactly as it is.
    pub fn unchanged(authorisation: &Authorisation) -> Self {
        Self {
            sca_status: authorisation.sca_status,
            authorisation_id: authorisation.authorisation_id.clone(),
            resource_id: authorisation.parent_id.clone(),
            sca_approach: authorisation.sca_approach,
            psu: authorisation.psu.clone(),
            chosen_sca_method: authorisation.chosen_sca_method.clone(),
            available_sca_methods: authorisation.available_sca_methods.clone(),
            challenge_data: None,
            psu_message: None,
            error_code: authorisation.error_code,
            next_step: None,
            resource_status: None,
        }
    }

    pub fn with_status(mut self, status: ScaStatus) -> Self {
        self.sca_status = status;
        self
    }

    pub fn with_psu(mut self, psu: PsuIdData) -> Self {
        self.psu = psu;
        self
    }

    /// Fails the authorisation.
    pub fn failed(mut self, code: MessageErrorCode) -> Self {
        self.sca_status = ScaStatus::Failed;
        self.error_code = Some(code);
        self
    }

    /// Refuses the update but leaves the status unchanged, so the PSU can try again.
    pub fn retry(mut self, code: MessageErrorCode) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn with_resource_status(mut self, status: ResourceStatus) -> Self {
        self.resource_status = Some(status);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.sca_status == ScaStatus::Failed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identification_only_updates() {
        let input = ScaInput::for_kind(AuthorisationKind::Ais);
        assert!(!input.is_psu_identification());
        let input = input.with_psu(PsuIdData::new("psu-1"));
        assert!(input.is_psu_identification());
        let input = input.with_password("pwd");
        assert!(!input.is_psu_identification());
        assert!(!ScaInput::for_kind(AuthorisationKind::Piis).with_psu(PsuIdData::default()).is_psu_identification());
    }

    #[test]
    fn inputs_carry_payment_authorisation_type() {
        let input = ScaInput::for_kind(AuthorisationKind::PisCancellation);
        assert_eq!(input.service_type, ServiceType::Pis);
        assert_eq!(input.payment_authorisation_type, Some(PaymentAuthorisationType::Cancelled));
        assert_eq!(ScaInput::for_kind(AuthorisationKind::Ais).payment_authorisation_type, None);
    }

    #[test]
    fn passwords_are_masked() {
        let input = ScaInput::for_kind(AuthorisationKind::Ais).with_password("hunter2").with_sca_authentication_data("123456");
        let debug = format!("{input:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("123456"));
    }
}
