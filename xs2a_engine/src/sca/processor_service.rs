//! The SCA steps shared by every family of authorisation.
//!
//! A family ([`super::AisAuthorisationProcessorService`] and friends) only decides policy: where the ASPSP may exempt
//! the PSU from SCA, what happens to the parent resource when the PSU has no SCA methods, and which status the
//! resource gets once the authorisation completes. The flows themselves live here.
use log::*;

use crate::{
    db_types::{
        AuthenticationObject,
        AuthorisationKind,
        MessageErrorCode,
        PsuIdData,
        ResourceStatus,
        ScaApproach,
        ScaStatus,
    },
    sca::{
        context::ScaContext,
        errors::ProcessorError,
        objects::{AuthorisationProcessorResponse, NextStep},
    },
    spi::{AuthorisationSpi, SpiAuthorisationStatus},
};

/// Fails the authorisation with the error code if the expression is an `Err`.
macro_rules! or_fail {
    ($expr:expr, $response:ident) => {
        match $expr {
            Ok(value) => value,
            Err(code) => return $response.failed(code),
        }
    };
}

/// Where in the flow an SCA exemption reported by the ASPSP is honoured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExemptionPoints {
    pub psu_authorisation: bool,
    pub sca_methods: bool,
    pub authorisation_code: bool,
}

impl ExemptionPoints {
    pub const NONE: ExemptionPoints =
        ExemptionPoints { psu_authorisation: false, sca_methods: false, authorisation_code: false };
    pub const ALL: ExemptionPoints =
        ExemptionPoints { psu_authorisation: true, sca_methods: true, authorisation_code: true };
    pub const AUTHORISATION_CODE: ExemptionPoints =
        ExemptionPoints { psu_authorisation: false, sca_methods: false, authorisation_code: true };
}

/// One family of SCA authorisations.
///
/// There is one `do_sca_*` method per SCA status. The state handlers call exactly one of them per request, so a
/// method only ever sees authorisations in its own status. The defaults implement the common flow; families
/// override them where they differ.
#[allow(async_fn_in_trait)]
pub trait AuthorisationProcessorService {
    fn authorisation_kind(&self) -> AuthorisationKind;

    fn exemption_points(&self) -> ExemptionPoints;

    /// The status the parent resource moves to when the PSU has no SCA methods at all. `None` leaves it unchanged.
    fn resource_status_without_sca_methods(&self) -> Option<ResourceStatus> {
        Some(ResourceStatus::Rejected)
    }

    /// The status the parent resource moves to when the authorisation is finalised or exempted. `reported` is the
    /// status the ASPSP reported with the SCA verification, if any.
    fn finalised_resource_status(&self, reported: Option<ResourceStatus>) -> ResourceStatus;

    async fn do_sca_received<S: AuthorisationSpi>(
        &self,
        ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        Ok(identify_or_authorise(self, ctx).await)
    }

    async fn do_sca_psu_identified<S: AuthorisationSpi>(
        &self,
        ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        Ok(identify_or_authorise(self, ctx).await)
    }

    async fn do_sca_started<S: AuthorisationSpi>(
        &self,
        ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        Ok(authorise_psu(self, ctx).await)
    }

    async fn do_sca_psu_authenticated<S: AuthorisationSpi>(
        &self,
        ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        Ok(select_sca_method(self, ctx).await)
    }

    async fn do_sca_method_selected<S: AuthorisationSpi>(
        &self,
        ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        Ok(verify_sca(self, ctx).await)
    }

    fn do_sca_finalised<S>(&self, ctx: &ScaContext<'_, S>) -> AuthorisationProcessorResponse {
        AuthorisationProcessorResponse::unchanged(ctx.authorisation())
    }

    fn do_sca_failed<S>(&self, ctx: &ScaContext<'_, S>) -> AuthorisationProcessorResponse {
        AuthorisationProcessorResponse::unchanged(ctx.authorisation())
    }

    fn do_sca_exempted<S>(&self, ctx: &ScaContext<'_, S>) -> AuthorisationProcessorResponse {
        AuthorisationProcessorResponse::unchanged(ctx.authorisation())
    }
}

/// RECEIVED and PSUIDENTIFIED: an update without a password only identifies the PSU. Anything else authenticates them.
pub async fn identify_or_authorise<P, S>(processor: &P, ctx: &mut ScaContext<'_, S>) -> AuthorisationProcessorResponse
where
    P: AuthorisationProcessorService + ?Sized,
    S: AuthorisationSpi,
{
    let request = ctx.request;
    if request.input.is_psu_identification() {
        let psu = request.input.psu.clone().unwrap_or_default();
        debug!("🔄️ PSU identified for authorisation {}", request.authorisation.authorisation_id);
        return ctx.unchanged().with_psu(psu).with_status(ScaStatus::PsuIdentified);
    }
    authorise_psu(processor, ctx).await
}

/// Authenticates the PSU with their password, then moves on to the SCA methods.
pub async fn authorise_psu<P, S>(processor: &P, ctx: &mut ScaContext<'_, S>) -> AuthorisationProcessorResponse
where
    P: AuthorisationProcessorService + ?Sized,
    S: AuthorisationSpi,
{
    let spi = ctx.spi;
    let request = ctx.request;
    let authorisation_id = &request.authorisation.authorisation_id;
    let response = ctx.unchanged();
    let Some(psu) = ctx.psu() else {
        warn!("🔄️ Authorisation {authorisation_id}: no PSU data in the update or the authorisation");
        return response.retry(MessageErrorCode::FormatErrorNoPsu);
    };
    let response = response.with_psu(psu.clone());
    let Some(password) = request.input.password.as_ref() else {
        warn!("🔄️ Authorisation {authorisation_id}: the update carries no PSU password");
        return response.retry(MessageErrorCode::FormatError);
    };
    let session = or_fail!(ctx.session_data(), response);
    let spi_ctx = ctx.spi_context(&psu);
    let result = or_fail!(ctx.call_spi(spi.authorise_psu(&spi_ctx, &psu, password, session.as_bytes())).await, response);
    let result = or_fail!(
        result.map_err(|e| {
            warn!("🔄️ Authorisation {authorisation_id}: PSU authorisation failed. {e}");
            e.error_code()
        }),
        response
    );
    match result.status {
        SpiAuthorisationStatus::Success => {},
        SpiAuthorisationStatus::Failure => {
            info!("🔄️ Authorisation {authorisation_id}: PSU credentials are invalid");
            return response.failed(MessageErrorCode::PsuCredentialsInvalid);
        },
        SpiAuthorisationStatus::AttemptFailure => {
            info!("🔄️ Authorisation {authorisation_id}: PSU credentials are invalid, retries remain");
            return response.retry(MessageErrorCode::PsuCredentialsInvalid);
        },
    }
    if result.sca_exempted && ctx.exemptions_enabled() && processor.exemption_points().psu_authorisation {
        return exempt(processor, response);
    }
    if request.authorisation.sca_approach == ScaApproach::Decoupled {
        debug!("🔄️ Authorisation {authorisation_id}: decoupled approach. The ASPSP picks the SCA method");
        return start_decoupled_sca(ctx, psu, None, response).await;
    }
    request_sca_methods(processor, ctx, psu, response).await
}

async fn request_sca_methods<P, S>(
    processor: &P,
    ctx: &mut ScaContext<'_, S>,
    psu: PsuIdData,
    mut response: AuthorisationProcessorResponse,
) -> AuthorisationProcessorResponse
where
    P: AuthorisationProcessorService + ?Sized,
    S: AuthorisationSpi,
{
    let spi = ctx.spi;
    let request = ctx.request;
    let authorisation_id = &request.authorisation.authorisation_id;
    let session = or_fail!(ctx.session_data(), response);
    let spi_ctx = ctx.spi_context(&psu);
    let result = or_fail!(ctx.call_spi(spi.request_available_sca_methods(&spi_ctx, session.as_bytes())).await, response);
    let result = or_fail!(
        result.map_err(|e| {
            warn!("🔄️ Authorisation {authorisation_id}: could not list SCA methods. {e}");
            e.error_code()
        }),
        response
    );
    if result.sca_exempted && ctx.exemptions_enabled() && processor.exemption_points().sca_methods {
        return exempt(processor, response);
    }
    let mut methods = result.methods;
    match methods.len() {
        0 => {
            warn!("🔄️ Authorisation {authorisation_id}: the PSU has no SCA methods");
            let response = response.failed(MessageErrorCode::ScaMethodUnknown);
            match processor.resource_status_without_sca_methods() {
                Some(status) => response.with_resource_status(status),
                None => response,
            }
        },
        1 => {
            let method = methods.remove(0);
            response.available_sca_methods = vec![method.clone()];
            if method.decoupled {
                debug!(
                    "🔄️ Authorisation {authorisation_id}: single SCA method {} is decoupled",
                    method.authentication_method_id
                );
                return start_decoupled_sca(ctx, psu, Some(method), response).await;
            }
            debug!(
                "🔄️ Authorisation {authorisation_id}: single SCA method {}. Requesting a challenge",
                method.authentication_method_id
            );
            request_authorisation_code(processor, ctx, psu, method, response).await
        },
        n => {
            debug!("🔄️ Authorisation {authorisation_id}: {n} SCA methods available");
            response.available_sca_methods = methods;
            response.chosen_sca_method = None;
            response.next_step = Some(NextStep::SelectAuthenticationMethod);
            response.with_status(ScaStatus::PsuAuthenticated)
        },
    }
}

async fn request_authorisation_code<P, S>(
    processor: &P,
    ctx: &mut ScaContext<'_, S>,
    psu: PsuIdData,
    method: AuthenticationObject,
    mut response: AuthorisationProcessorResponse,
) -> AuthorisationProcessorResponse
where
    P: AuthorisationProcessorService + ?Sized,
    S: AuthorisationSpi,
{
    let spi = ctx.spi;
    let request = ctx.request;
    let authorisation_id = &request.authorisation.authorisation_id;
    let session = or_fail!(ctx.session_data(), response);
    let spi_ctx = ctx.spi_context(&psu);
    let method_id = method.authentication_method_id.as_str();
    let result =
        or_fail!(ctx.call_spi(spi.request_authorisation_code(&spi_ctx, method_id, session.as_bytes())).await, response);
    let result = or_fail!(
        result.map_err(|e| {
            warn!("🔄️ Authorisation {authorisation_id}: challenge request for {method_id} failed. {e}");
            e.error_code()
        }),
        response
    );
    if result.sca_exempted && ctx.exemptions_enabled() && processor.exemption_points().authorisation_code {
        return exempt(processor, response);
    }
    response.chosen_sca_method = Some(result.selected_method.unwrap_or(method));
    response.challenge_data = result.challenge;
    response.next_step = Some(NextStep::AuthoriseTransaction);
    response.with_status(ScaStatus::ScaMethodSelected)
}

/// PSUAUTHENTICATED: the PSU picked one of the offered methods.
pub async fn select_sca_method<P, S>(processor: &P, ctx: &mut ScaContext<'_, S>) -> AuthorisationProcessorResponse
where
    P: AuthorisationProcessorService + ?Sized,
    S: AuthorisationSpi,
{
    let request = ctx.request;
    let authorisation = &request.authorisation;
    let response = ctx.unchanged();
    let Some(method_id) = request.input.authentication_method_id.as_deref() else {
        warn!("🔄️ Authorisation {}: no SCA method was selected", authorisation.authorisation_id);
        return response.retry(MessageErrorCode::FormatError);
    };
    let Some(method) = authorisation.available_sca_methods.iter().find(|m| m.authentication_method_id == method_id)
    else {
        warn!("🔄️ Authorisation {}: SCA method {method_id} was not offered", authorisation.authorisation_id);
        return response.retry(MessageErrorCode::ScaMethodUnknown);
    };
    let psu = ctx.psu().unwrap_or_else(|| authorisation.psu.clone());
    let response = response.with_psu(psu.clone());
    if method.decoupled {
        return start_decoupled_sca(ctx, psu, Some(method.clone()), response).await;
    }
    request_authorisation_code(processor, ctx, psu, method.clone(), response).await
}

/// Hands SCA over to the ASPSP's app. `method` is the decoupled method the PSU chose or was given, if any.
async fn start_decoupled_sca<S>(
    ctx: &mut ScaContext<'_, S>,
    psu: PsuIdData,
    method: Option<AuthenticationObject>,
    mut response: AuthorisationProcessorResponse,
) -> AuthorisationProcessorResponse
where
    S: AuthorisationSpi,
{
    let spi = ctx.spi;
    let request = ctx.request;
    let authorisation_id = &request.authorisation.authorisation_id;
    let session = or_fail!(ctx.session_data(), response);
    let mut spi_ctx = ctx.spi_context(&psu);
    spi_ctx.sca_approach = ScaApproach::Decoupled;
    let method_id = method.as_ref().map(|m| m.authentication_method_id.clone());
    let result =
        or_fail!(ctx.call_spi(spi.start_sca_decoupled(&spi_ctx, method_id, session.as_bytes())).await, response);
    let result = or_fail!(
        result.map_err(|e| {
            warn!("🔄️ Authorisation {authorisation_id}: decoupled SCA could not be started. {e}");
            e.error_code()
        }),
        response
    );
    info!("🔄️ Authorisation {authorisation_id}: decoupled SCA started. Waiting for the PSU to confirm in their app");
    response.sca_approach = ScaApproach::Decoupled;
    response.chosen_sca_method = method;
    response.challenge_data = None;
    response.psu_message = result.psu_message;
    response.next_step = Some(NextStep::AuthoriseInBankApp);
    response.with_status(ScaStatus::ScaMethodSelected)
}

/// SCAMETHODSELECTED: check the PSU's answer to the challenge.
pub async fn verify_sca<P, S>(processor: &P, ctx: &mut ScaContext<'_, S>) -> AuthorisationProcessorResponse
where
    P: AuthorisationProcessorService + ?Sized,
    S: AuthorisationSpi,
{
    let spi = ctx.spi;
    let request = ctx.request;
    let authorisation_id = &request.authorisation.authorisation_id;
    let response = ctx.unchanged();
    let Some(otp) = request.input.sca_authentication_data.as_ref() else {
        warn!("🔄️ Authorisation {authorisation_id}: the update carries no SCA authentication data");
        return response.retry(MessageErrorCode::FormatError);
    };
    let psu = ctx.psu().unwrap_or_else(|| request.authorisation.psu.clone());
    let session = or_fail!(ctx.session_data(), response);
    let spi_ctx = ctx.spi_context(&psu);
    let result = or_fail!(ctx.call_spi(spi.verify_sca_authorisation(&spi_ctx, otp, session.as_bytes())).await, response);
    let result = or_fail!(
        result.map_err(|e| {
            warn!("🔄️ Authorisation {authorisation_id}: SCA verification failed. {e}");
            e.error_code()
        }),
        response
    );
    match result.status {
        SpiAuthorisationStatus::Success => {
            let status = processor.finalised_resource_status(result.resource_status);
            info!("🔄️ Authorisation {authorisation_id} finalised. Resource is now {status}");
            response.with_status(ScaStatus::Finalised).with_resource_status(status)
        },
        SpiAuthorisationStatus::Failure => response.failed(MessageErrorCode::ScaInvalid),
        SpiAuthorisationStatus::AttemptFailure => response.retry(MessageErrorCode::ScaInvalid),
    }
}

fn exempt<P>(processor: &P, response: AuthorisationProcessorResponse) -> AuthorisationProcessorResponse
where P: AuthorisationProcessorService + ?Sized {
    let status = processor.finalised_resource_status(None);
    info!("🔄️ Authorisation {} is exempted from SCA. Resource is now {status}", response.authorisation_id);
    response.with_status(ScaStatus::Exempted).with_resource_status(status)
}
