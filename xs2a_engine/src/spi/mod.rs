//! # Service provider interface
//!
//! The engine never talks to the bank directly. Every bank-facing step of an SCA flow goes through an
//! [`AuthorisationSpi`] implementation supplied by the ASPSP.
//!
//! Each call receives the current plaintext session data (empty if none has been stored yet) and returns an
//! [`SpiResponse`], which may carry updated session data. The engine encrypts and persists that data regardless of
//! whether the call succeeded.
mod objects;

pub use objects::{
    AuthorisationCodeResult,
    AvailableScaMethods,
    DecoupledScaResult,
    PsuAuthorisationResult,
    ScaVerification,
    SpiAuthorisationStatus,
    SpiContext,
    SpiError,
    SpiResponse,
};
use xs2a_common::Secret;

use crate::db_types::PsuIdData;

#[allow(async_fn_in_trait)]
pub trait AuthorisationSpi {
    /// Checks the PSU's login credentials.
    async fn authorise_psu(
        &self,
        ctx: &SpiContext,
        psu: &PsuIdData,
        password: &Secret<String>,
        session_data: &[u8],
    ) -> SpiResponse<PsuAuthorisationResult>;

    /// Lists the SCA methods the PSU has enrolled for this resource.
    async fn request_available_sca_methods(
        &self,
        ctx: &SpiContext,
        session_data: &[u8],
    ) -> SpiResponse<AvailableScaMethods>;

    /// Asks the ASPSP to send a challenge through the given SCA method.
    async fn request_authorisation_code(
        &self,
        ctx: &SpiContext,
        authentication_method_id: &str,
        session_data: &[u8],
    ) -> SpiResponse<AuthorisationCodeResult>;

    /// Starts SCA on a separate device, e.g. a push notification to the ASPSP's app. The PSU confirms there, so no
    /// challenge goes back to the TPP. `authentication_method_id` is `None` when the authorisation uses the decoupled
    /// approach and the PSU never chose a method.
    async fn start_sca_decoupled(
        &self,
        ctx: &SpiContext,
        authentication_method_id: Option<String>,
        session_data: &[u8],
    ) -> SpiResponse<DecoupledScaResult>;

    /// Checks the PSU's answer to the challenge.
    async fn verify_sca_authorisation(
        &self,
        ctx: &SpiContext,
        sca_authentication_data: &Secret<String>,
        session_data: &[u8],
    ) -> SpiResponse<ScaVerification>;
}
