use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Implements `Display` and `FromStr` for a fieldless enum using the given wire names.
macro_rules! wire_names {
    ($for_enum:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl Display for $for_enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $name),)+
                }
            }
        }

        impl FromStr for $for_enum {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(ConversionError::new($kind, other)),
                }
            }
        }
    };
}

//--------------------------------------       ScaStatus       ---------------------------------------------------------
/// The SCA status of an authorisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScaStatus {
    /// Created for an embedded or decoupled approach. Nothing is known about the PSU yet.
    Received,
    /// The PSU has identified themselves but has not supplied credentials.
    PsuIdentified,
    /// The PSU credentials were accepted and more than one SCA method is available.
    PsuAuthenticated,
    /// An SCA method has been chosen and a challenge has been sent to the PSU.
    ScaMethodSelected,
    /// Created for a redirect or OAuth approach.
    Started,
    Finalised,
    Failed,
    /// The ASPSP decided that no SCA is required.
    Exempted,
}

wire_names!(ScaStatus, "SCA status", {
    Received => "RECEIVED",
    PsuIdentified => "PSUIDENTIFIED",
    PsuAuthenticated => "PSUAUTHENTICATED",
    ScaMethodSelected => "SCAMETHODSELECTED",
    Started => "STARTED",
    Finalised => "FINALISED",
    Failed => "FAILED",
    Exempted => "EXEMPTED",
});

impl ScaStatus {
    pub const ALL: [ScaStatus; 8] = [
        ScaStatus::Received,
        ScaStatus::PsuIdentified,
        ScaStatus::PsuAuthenticated,
        ScaStatus::ScaMethodSelected,
        ScaStatus::Started,
        ScaStatus::Finalised,
        ScaStatus::Failed,
        ScaStatus::Exempted,
    ];

    /// Terminal statuses never change again. Any further update is a no-op.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScaStatus::Finalised | ScaStatus::Failed | ScaStatus::Exempted)
    }
}

//--------------------------------------      ServiceType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    /// Account information
    Ais,
    /// Payment initiation
    Pis,
    /// Confirmation of funds
    Piis,
}

wire_names!(ServiceType, "service type", {
    Ais => "AIS",
    Pis => "PIS",
    Piis => "PIIS",
});

//------------------------------------ PaymentAuthorisationType -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentAuthorisationType {
    Created,
    Cancelled,
}

wire_names!(PaymentAuthorisationType, "payment authorisation type", {
    Created => "CREATED",
    Cancelled => "CANCELLED",
});

//--------------------------------------  AuthorisationKind    ---------------------------------------------------------
/// What an authorisation authorises. Fixed when the authorisation is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorisationKind {
    Ais,
    PisCreation,
    PisCancellation,
    Piis,
}

wire_names!(AuthorisationKind, "authorisation kind", {
    Ais => "AIS",
    PisCreation => "PIS_CREATION",
    PisCancellation => "PIS_CANCELLATION",
    Piis => "PIIS",
});

impl AuthorisationKind {
    pub fn service_type(&self) -> ServiceType {
        match self {
            AuthorisationKind::Ais => ServiceType::Ais,
            AuthorisationKind::PisCreation | AuthorisationKind::PisCancellation => ServiceType::Pis,
            AuthorisationKind::Piis => ServiceType::Piis,
        }
    }

    pub fn payment_authorisation_type(&self) -> Option<PaymentAuthorisationType> {
        match self {
            AuthorisationKind::PisCreation => Some(PaymentAuthorisationType::Created),
            AuthorisationKind::PisCancellation => Some(PaymentAuthorisationType::Cancelled),
            _ => None,
        }
    }

    /// Whether a new authorisation of this kind may be started on a resource in the given status. Consents and
    /// payments take authorisations until they are decided. A payment can be cancelled until it is rejected or
    /// cancelled.
    pub fn can_start_on(&self, status: ResourceStatus) -> bool {
        use ResourceStatus::*;
        match self {
            AuthorisationKind::Ais | AuthorisationKind::Piis | AuthorisationKind::PisCreation => {
                matches!(status, Received | PartiallyAuthorised)
            },
            AuthorisationKind::PisCancellation => matches!(status, Received | PartiallyAuthorised | Valid),
        }
    }
}

//--------------------------------------      ScaApproach      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScaApproach {
    Redirect,
    Embedded,
    Decoupled,
    Oauth,
}

wire_names!(ScaApproach, "SCA approach", {
    Redirect => "REDIRECT",
    Embedded => "EMBEDDED",
    Decoupled => "DECOUPLED",
    Oauth => "OAUTH",
});

impl ScaApproach {
    /// The status a freshly created authorisation starts in.
    pub fn initial_status(&self) -> ScaStatus {
        match self {
            ScaApproach::Embedded | ScaApproach::Decoupled => ScaStatus::Received,
            ScaApproach::Redirect | ScaApproach::Oauth => ScaStatus::Started,
        }
    }
}

//--------------------------------------    ResourceStatus     ---------------------------------------------------------
/// Status of the consent or payment an authorisation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Received,
    /// Multilevel SCA: at least one, but not all, of the required PSUs have authorised.
    PartiallyAuthorised,
    Valid,
    Rejected,
    Cancelled,
}

wire_names!(ResourceStatus, "resource status", {
    Received => "RECEIVED",
    PartiallyAuthorised => "PARTIALLY_AUTHORISED",
    Valid => "VALID",
    Rejected => "REJECTED",
    Cancelled => "CANCELLED",
});

//--------------------------------------   MessageErrorCode    ---------------------------------------------------------
/// The TPP message codes the engine can attach to an authorisation or a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageErrorCode {
    PsuCredentialsInvalid,
    ScaMethodUnknown,
    ScaInvalid,
    FormatError,
    FormatErrorNoPsu,
    ConsentUnknown,
    ResourceUnknown,
    ConsentDataUnavailable,
    ServiceUnavailable,
    RequestTimeout,
    /// The authorisation outlived its expiry time before it was completed.
    ResourceExpired,
}

wire_names!(MessageErrorCode, "message error code", {
    PsuCredentialsInvalid => "PSU_CREDENTIALS_INVALID",
    ScaMethodUnknown => "SCA_METHOD_UNKNOWN",
    ScaInvalid => "SCA_INVALID",
    FormatError => "FORMAT_ERROR",
    FormatErrorNoPsu => "FORMAT_ERROR_NO_PSU",
    ConsentUnknown => "CONSENT_UNKNOWN",
    ResourceUnknown => "RESOURCE_UNKNOWN",
    ConsentDataUnavailable => "CONSENT_DATA_UNAVAILABLE",
    ServiceUnavailable => "SERVICE_UNAVAILABLE",
    RequestTimeout => "REQUEST_TIMEOUT",
    ResourceExpired => "RESOURCE_EXPIRED",
});

//--------------------------------------       PsuIdData       ---------------------------------------------------------
/// PSU identification as supplied by the TPP in request headers. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsuIdData {
    pub psu_id: Option<String>,
    pub psu_id_type: Option<String>,
    pub psu_corporate_id: Option<String>,
    pub psu_corporate_id_type: Option<String>,
}

impl PsuIdData {
    pub fn new<S: Into<String>>(psu_id: S) -> Self {
        Self { psu_id: Some(psu_id.into()), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.psu_id.is_none()
            && self.psu_id_type.is_none()
            && self.psu_corporate_id.is_none()
            && self.psu_corporate_id_type.is_none()
    }
}

//-------------------------------------- AuthenticationObject  ---------------------------------------------------------
/// An SCA method offered by the ASPSP, e.g. an SMS OTP or a push notification to an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationObject {
    pub authentication_type: String,
    pub authentication_method_id: String,
    pub authentication_version: Option<String>,
    pub name: Option<String>,
    pub explanation: Option<String>,
    pub decoupled: bool,
}

impl AuthenticationObject {
    pub fn new<S: Into<String>, T: Into<String>>(authentication_method_id: S, authentication_type: T) -> Self {
        Self {
            authentication_type: authentication_type.into(),
            authentication_method_id: authentication_method_id.into(),
            authentication_version: None,
            name: None,
            explanation: None,
            decoupled: false,
        }
    }

    pub fn decoupled(mut self) -> Self {
        self.decoupled = true;
        self
    }
}

//--------------------------------------     ChallengeData     ---------------------------------------------------------
/// What the PSU needs in order to answer the SCA challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeData {
    pub data: Option<String>,
    pub image_link: Option<String>,
    pub otp_max_length: Option<u32>,
    pub additional_information: Option<String>,
}

//--------------------------------------     Authorisation     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorisation {
    pub authorisation_id: String,
    /// The internal id of the consent or payment being authorised.
    pub parent_id: String,
    pub authorisation_kind: AuthorisationKind,
    pub sca_status: ScaStatus,
    pub sca_approach: ScaApproach,
    pub psu: PsuIdData,
    pub chosen_sca_method: Option<AuthenticationObject>,
    pub available_sca_methods: Vec<AuthenticationObject>,
    /// Only ever set on FAILED authorisations. A refused update reports its code in the response but stores nothing.
    pub error_code: Option<MessageErrorCode>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Incremented on every committed transition.
    pub version: i64,
}

impl Authorisation {
    /// Whether the authorisation is past its expiry time at `now`. Only non-terminal authorisations can expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.sca_status.is_terminal() && self.expires_at <= now
    }
}

//--------------------------------------   NewAuthorisation    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewAuthorisation {
    pub authorisation_id: String,
    pub parent_id: String,
    pub authorisation_kind: AuthorisationKind,
    pub sca_approach: ScaApproach,
    pub psu: PsuIdData,
    pub expires_at: DateTime<Utc>,
}

impl NewAuthorisation {
    pub fn initial_status(&self) -> ScaStatus {
        self.sca_approach.initial_status()
    }
}

//--------------------------------------    ParentResource     ---------------------------------------------------------
/// A consent or payment that authorisations can be started for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentResource {
    pub internal_id: String,
    /// The identifier handed out to the TPP. It is issued once and never changes.
    pub encrypted_id: String,
    pub service_type: ServiceType,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResource {
    pub internal_id: String,
    pub encrypted_id: String,
    pub service_type: ServiceType,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sca_status_names() {
        for status in ScaStatus::ALL {
            assert_eq!(status.to_string().parse::<ScaStatus>().unwrap(), status);
        }
        assert_eq!(ScaStatus::ScaMethodSelected.to_string(), "SCAMETHODSELECTED");
        let err = "AUTHORISED".parse::<ScaStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid SCA status: AUTHORISED");
    }

    #[test]
    fn terminal_statuses() {
        let terminal = ScaStatus::ALL.iter().filter(|s| s.is_terminal()).copied().collect::<Vec<_>>();
        assert_eq!(terminal, vec![ScaStatus::Finalised, ScaStatus::Failed, ScaStatus::Exempted]);
    }

    #[test]
    fn kinds_map_to_service_types() {
        assert_eq!(AuthorisationKind::PisCancellation.service_type(), ServiceType::Pis);
        assert_eq!(
            AuthorisationKind::PisCancellation.payment_authorisation_type(),
            Some(PaymentAuthorisationType::Cancelled)
        );
        assert_eq!(AuthorisationKind::Piis.payment_authorisation_type(), None);
        assert_eq!("PIS_CREATION".parse::<AuthorisationKind>().unwrap(), AuthorisationKind::PisCreation);
    }

    #[test]
    fn decided_resources_take_no_new_authorisations() {
        for kind in [AuthorisationKind::Ais, AuthorisationKind::Piis, AuthorisationKind::PisCreation] {
            assert!(kind.can_start_on(ResourceStatus::Received));
            assert!(kind.can_start_on(ResourceStatus::PartiallyAuthorised));
            assert!(!kind.can_start_on(ResourceStatus::Valid));
            assert!(!kind.can_start_on(ResourceStatus::Rejected));
            assert!(!kind.can_start_on(ResourceStatus::Cancelled));
        }
        let cancellation = AuthorisationKind::PisCancellation;
        assert!(cancellation.can_start_on(ResourceStatus::Valid));
        assert!(!cancellation.can_start_on(ResourceStatus::Rejected));
        assert!(!cancellation.can_start_on(ResourceStatus::Cancelled));
    }

    #[test]
    fn only_open_authorisations_expire() {
        let now = Utc::now();
        let mut authorisation = Authorisation {
            authorisation_id: "auth-1".into(),
            parent_id: "consent-1".into(),
            authorisation_kind: AuthorisationKind::Ais,
            sca_status: ScaStatus::PsuAuthenticated,
            sca_approach: ScaApproach::Embedded,
            psu: PsuIdData::new("psu-1"),
            chosen_sca_method: None,
            available_sca_methods: vec![],
            error_code: None,
            created_at: now - chrono::Duration::minutes(40),
            updated_at: now - chrono::Duration::minutes(40),
            expires_at: now - chrono::Duration::minutes(10),
            version: 3,
        };
        assert!(authorisation.is_expired_at(now));
        assert!(!authorisation.is_expired_at(now - chrono::Duration::minutes(20)));
        authorisation.sca_status = ScaStatus::Finalised;
        assert!(!authorisation.is_expired_at(now));
    }

    #[test]
    fn initial_status_depends_on_approach() {
        assert_eq!(ScaApproach::Embedded.initial_status(), ScaStatus::Received);
        assert_eq!(ScaApproach::Decoupled.initial_status(), ScaStatus::Received);
        assert_eq!(ScaApproach::Redirect.initial_status(), ScaStatus::Started);
        assert_eq!(ScaApproach::Oauth.initial_status(), ScaStatus::Started);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&MessageErrorCode::PsuCredentialsInvalid).unwrap();
        assert_eq!(json, r#""PSU_CREDENTIALS_INVALID""#);
        let json = serde_json::to_string(&ScaStatus::PsuAuthenticated).unwrap();
        assert_eq!(json, r#""PSUAUTHENTICATED""#);
        assert!(PsuIdData::default().is_empty());
        assert!(!PsuIdData::new("psu-1").is_empty());
    }
}
