use thiserror::Error;

use crate::db_types::{
    AuthenticationObject,
    AuthorisationKind,
    ChallengeData,
    MessageErrorCode,
    PsuIdData,
    ResourceStatus,
    ScaApproach,
    ServiceType,
};

/// Who is asking, and on behalf of which authorisation. Passed to every SPI call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiContext {
    pub service_type: ServiceType,
    pub authorisation_kind: AuthorisationKind,
    pub authorisation_id: String,
    /// The internal id of the consent or payment.
    pub resource_id: String,
    pub psu: PsuIdData,
    pub sca_approach: ScaApproach,
}

/// The result of an SPI call.
///
/// The ASPSP may hand back new session data whether the call succeeded or not. It is persisted in either case.
#[derive(Debug, Clone)]
pub struct SpiResponse<T> {
    pub payload: Result<T, SpiError>,
    pub session_data: Option<Vec<u8>>,
}

impl<T> SpiResponse<T> {
    pub fn success(payload: T) -> Self {
        Self { payload: Ok(payload), session_data: None }
    }

    pub fn error(error: SpiError) -> Self {
        Self { payload: Err(error), session_data: None }
    }

    pub fn with_session_data(mut self, data: Vec<u8>) -> Self {
        self.session_data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpiError {
    /// The ASPSP processed the request and refused it.
    #[error("The ASPSP rejected the request with {code}")]
    Rejected { code: MessageErrorCode, message: Option<String> },
    #[error("The ASPSP could not be reached. {0}")]
    Unavailable(String),
    #[error("The ASPSP did not answer within {0} seconds")]
    TimedOut(u64),
}

impl SpiError {
    pub fn rejected(code: MessageErrorCode) -> Self {
        Self::Rejected { code, message: None }
    }

    /// The code recorded against the authorisation when this error fails it.
    pub fn error_code(&self) -> MessageErrorCode {
        match self {
            SpiError::Rejected { code, .. } => *code,
            SpiError::Unavailable(_) => MessageErrorCode::ServiceUnavailable,
            SpiError::TimedOut(_) => MessageErrorCode::RequestTimeout,
        }
    }
}

/// The outcome of checking a PSU secret (password or OTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiAuthorisationStatus {
    Success,
    /// The secret was wrong and no retries are left.
    Failure,
    /// The secret was wrong, but the PSU may try again.
    AttemptFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsuAuthorisationResult {
    pub status: SpiAuthorisationStatus,
    pub sca_exempted: bool,
}

impl PsuAuthorisationResult {
    pub fn new(status: SpiAuthorisationStatus) -> Self {
        Self { status, sca_exempted: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableScaMethods {
    pub methods: Vec<AuthenticationObject>,
    pub sca_exempted: bool,
}

impl AvailableScaMethods {
    pub fn new(methods: Vec<AuthenticationObject>) -> Self {
        Self { methods, sca_exempted: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorisationCodeResult {
    /// The method the challenge was sent through, if the ASPSP reports it.
    pub selected_method: Option<AuthenticationObject>,
    pub challenge: Option<ChallengeData>,
    pub sca_exempted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaVerification {
    pub status: SpiAuthorisationStatus,
    /// Set by the ASPSP when the resource status changes as a result, e.g. `PARTIALLY_AUTHORISED` when further PSUs
    /// still have to authorise.
    pub resource_status: Option<ResourceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoupledScaResult {
    /// Shown to the PSU by the TPP, e.g. "Please confirm the payment in your banking app".
    pub psu_message: Option<String>,
}
