use std::{future::Future, time::Duration};

use log::*;

use crate::{
    db_types::{Authorisation, MessageErrorCode, PsuIdData},
    sca::{
        objects::{AuthorisationProcessorRequest, AuthorisationProcessorResponse, ScaInput},
        session::SessionDataProvider,
    },
    security::DecryptedData,
    spi::{SpiContext, SpiError, SpiResponse},
};

pub const DEFAULT_SPI_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine-wide knobs for the SCA flows.
#[derive(Debug, Clone, Copy)]
pub struct ScaSettings {
    /// Every SPI call that takes longer than this fails the authorisation with `REQUEST_TIMEOUT`.
    pub spi_timeout: Duration,
    /// When false, SCA exemptions reported by the ASPSP are ignored.
    pub exemptions_enabled: bool,
}

impl Default for ScaSettings {
    fn default() -> Self {
        Self { spi_timeout: DEFAULT_SPI_TIMEOUT, exemptions_enabled: true }
    }
}

/// Everything a state handler may use while processing one request.
pub struct ScaContext<'a, S> {
    pub(crate) spi: &'a S,
    pub(crate) settings: &'a ScaSettings,
    pub(crate) request: &'a AuthorisationProcessorRequest,
    pub(crate) session: SessionDataProvider<'a>,
}

impl<'a, S> ScaContext<'a, S> {
    pub fn new(
        spi: &'a S,
        settings: &'a ScaSettings,
        request: &'a AuthorisationProcessorRequest,
        session: SessionDataProvider<'a>,
    ) -> Self {
        Self { spi, settings, request, session }
    }

    pub fn authorisation(&self) -> &Authorisation {
        &self.request.authorisation
    }

    pub fn input(&self) -> &ScaInput {
        &self.request.input
    }

    /// A response that leaves the authorisation as it is. Handlers build their result from this.
    pub fn unchanged(&self) -> AuthorisationProcessorResponse {
        let mut response = AuthorisationProcessorResponse::unchanged(self.authorisation());
        response.error_code = None;
        response
    }

    /// The PSU for this step: whoever the update names, or else whoever the authorisation was started for.
    pub fn psu(&self) -> Option<PsuIdData> {
        self.input()
            .psu
            .as_ref()
            .filter(|p| !p.is_empty())
            .or(Some(&self.authorisation().psu).filter(|p| !p.is_empty()))
            .cloned()
    }

    pub fn spi_context(&self, psu: &PsuIdData) -> SpiContext {
        let authorisation = self.authorisation();
        SpiContext {
            service_type: authorisation.authorisation_kind.service_type(),
            authorisation_kind: authorisation.authorisation_kind,
            authorisation_id: authorisation.authorisation_id.clone(),
            resource_id: authorisation.parent_id.clone(),
            psu: psu.clone(),
            sca_approach: authorisation.sca_approach,
        }
    }

    /// The plaintext session data to hand to the next SPI call.
    pub fn session_data(&mut self) -> Result<DecryptedData, MessageErrorCode> {
        self.session.current().map_err(|_| MessageErrorCode::ConsentDataUnavailable)
    }

    /// Runs an SPI call under the configured timeout and records whatever session data it returns.
    ///
    /// The outer error means the authorisation must fail with that code because the session data could not be
    /// re-encrypted. The inner result is the ASPSP's answer.
    pub async fn call_spi<T, F>(&mut self, call: F) -> Result<Result<T, SpiError>, MessageErrorCode>
    where F: Future<Output = SpiResponse<T>> {
        let timeout = self.settings.spi_timeout;
        let response = match tokio::time::timeout(timeout, call).await {
            Ok(response) => response,
            Err(_) => {
                warn!(
                    "🔄️ SPI call for authorisation {} timed out after {}s",
                    self.authorisation().authorisation_id,
                    timeout.as_secs()
                );
                SpiResponse::error(SpiError::TimedOut(timeout.as_secs()))
            },
        };
        self.session.update(response.session_data).map_err(|_| MessageErrorCode::ConsentDataUnavailable)?;
        Ok(response.payload)
    }

    pub fn exemptions_enabled(&self) -> bool {
        self.settings.exemptions_enabled
    }
}
