use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Authorisation, MessageErrorCode, ServiceType},
    sca::{
        context::{ScaContext, ScaSettings},
        errors::ProcessorError,
        locks::AuthorisationLocks,
        objects::{AuthorisationProcessorRequest, AuthorisationProcessorResponse, ScaInput},
        service_provider::{AuthorisationProcessorServiceProvider, ResolvedProcessor},
        session::SessionDataProvider,
        state_handlers::handle_status,
        transitions::is_allowed,
    },
    security::{ConsentDataCodec, EncryptedData},
    spi::AuthorisationSpi,
    traits::{AuthorisationTransition, ConsentManagementDatabase, SessionDataUpdate},
};

/// `AuthorisationStateDispatcher` is the entry point of the SCA engine. It drives an authorisation through one step of
/// the SCA state machine per update.
///
/// For every update it
/// * serialises against other updates of the same authorisation on this node,
/// * fails authorisations that have expired, or whose resource no longer exists,
/// * selects the processor service for the authorisation's family and the single state handler for its status,
/// * validates the resulting transition, and
/// * commits the new status, the parent resource status and the re-encrypted session data in one transaction.
///
/// Authorisations in a terminal status are returned as stored, without touching the SPI, the crypto layer or the
/// store.
pub struct AuthorisationStateDispatcher<B, S> {
    db: B,
    spi: Arc<S>,
    codec: ConsentDataCodec,
    providers: AuthorisationProcessorServiceProvider,
    settings: ScaSettings,
    locks: AuthorisationLocks,
}

impl<B, S> Debug for AuthorisationStateDispatcher<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorisationStateDispatcher({:?})", self.settings)
    }
}

impl<B, S> AuthorisationStateDispatcher<B, S> {
    pub fn new(db: B, spi: Arc<S>, codec: ConsentDataCodec) -> Self {
        Self {
            db,
            spi,
            codec,
            providers: AuthorisationProcessorServiceProvider::default(),
            settings: ScaSettings::default(),
            locks: AuthorisationLocks::default(),
        }
    }

    pub fn with_settings(mut self, settings: ScaSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Shares the lock table with other dispatchers in this process.
    pub fn with_locks(mut self, locks: AuthorisationLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn settings(&self) -> &ScaSettings {
        &self.settings
    }
}

impl<B, S> AuthorisationStateDispatcher<B, S>
where
    B: ConsentManagementDatabase,
    S: AuthorisationSpi,
{
    /// Applies a TPP update to the authorisation with the given id.
    ///
    /// Errors are reserved for precondition violations and store failures. Everything else, including a wrong
    /// password, an unavailable ASPSP or undecryptable session data, is reported through the status and error code of
    /// the response.
    pub async fn process_update(
        &self,
        authorisation_id: &str,
        input: ScaInput,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        let _guard = self.locks.lock(authorisation_id).await;
        let authorisation = self
            .db
            .fetch_authorisation(authorisation_id)
            .await?
            .ok_or_else(|| ProcessorError::AuthorisationNotFound(authorisation_id.to_string()))?;
        self.providers.resolve_for(input.service_type, input.payment_authorisation_type, authorisation.authorisation_kind)?;
        if authorisation.is_expired_at(Utc::now()) {
            warn!(
                "🔄️ Authorisation {} expired at {}. Failing the authorisation",
                authorisation.authorisation_id, authorisation.expires_at
            );
            return self.fail_unprocessed(authorisation, MessageErrorCode::ResourceExpired).await;
        }
        match self.db.fetch_resource(&authorisation.parent_id).await? {
            Some(resource) => self.apply(AuthorisationProcessorRequest::new(authorisation, resource, input)).await,
            None => self.fail_orphan(authorisation).await,
        }
    }

    /// Runs the state handler for `request.sca_status` and commits the result.
    pub async fn apply(
        &self,
        request: AuthorisationProcessorRequest,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        let authorisation = &request.authorisation;
        let processor = self.providers.resolve_for(
            request.input.service_type,
            request.input.payment_authorisation_type,
            authorisation.authorisation_kind,
        )?;
        let encrypted_id = request.resource.encrypted_id.as_str();
        let terminal = request.sca_status.is_terminal();
        let stored = if terminal { None } else { self.db.fetch_session_data(encrypted_id).await? };
        let session = SessionDataProvider::new(&self.codec, encrypted_id, stored);
        let mut ctx = ScaContext::new(self.spi.as_ref(), &self.settings, &request, session);
        let status = request.sca_status;
        let result = match processor {
            ResolvedProcessor::Ais(p) => handle_status(status, &p, &mut ctx).await,
            ResolvedProcessor::Piis(p) => handle_status(status, &p, &mut ctx).await,
            ResolvedProcessor::PisCreation(p) => handle_status(status, &p, &mut ctx).await,
            ResolvedProcessor::PisCancellation(p) => handle_status(status, &p, &mut ctx).await,
        };
        let pending = ctx.session.take_pending();
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("🔄️ Authorisation {} could not be processed. {e}", authorisation.authorisation_id);
                self.save_session_data(encrypted_id, pending).await?;
                return Err(e);
            },
        };
        if terminal {
            debug!("🔄️ Authorisation {} is already {status}. Nothing to do", authorisation.authorisation_id);
            return Ok(response);
        }
        if !is_allowed(status, response.sca_status) {
            error!(
                "🔄️ Authorisation {}: the {} handler produced the illegal transition {status} -> {}",
                authorisation.authorisation_id, authorisation.authorisation_kind, response.sca_status
            );
            self.save_session_data(encrypted_id, pending).await?;
            return Err(ProcessorError::UnsupportedTransition { from: status, to: response.sca_status });
        }
        let transition = AuthorisationTransition {
            authorisation_id: authorisation.authorisation_id.clone(),
            expected_version: authorisation.version,
            sca_status: response.sca_status,
            sca_approach: response.sca_approach,
            psu: response.psu.clone(),
            chosen_sca_method: response.chosen_sca_method.clone(),
            available_sca_methods: response.available_sca_methods.clone(),
            error_code: response.error_code.filter(|_| response.is_failed()),
            resource_status: response.resource_status,
            session_data: pending.map(|data| SessionDataUpdate { encrypted_id: encrypted_id.to_string(), data }),
        };
        let committed = self.db.commit_transition(transition).await?;
        info!(
            "🔄️ Authorisation {} moved from {status} to {} (version {})",
            committed.authorisation_id, committed.sca_status, committed.version
        );
        Ok(response)
    }

    async fn save_session_data(&self, encrypted_id: &str, data: Option<EncryptedData>) -> Result<(), ProcessorError> {
        if let Some(data) = data {
            self.db.store_session_data(encrypted_id, data).await?;
            debug!("🔄️ Session data saved after an aborted SCA step");
        }
        Ok(())
    }

    /// The resource an authorisation belongs to has disappeared. The authorisation can never complete.
    async fn fail_orphan(&self, authorisation: Authorisation) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        let response = AuthorisationProcessorResponse::unchanged(&authorisation);
        if authorisation.sca_status.is_terminal() {
            return Ok(response);
        }
        let code = match authorisation.authorisation_kind.service_type() {
            ServiceType::Ais | ServiceType::Piis => MessageErrorCode::ConsentUnknown,
            ServiceType::Pis => MessageErrorCode::ResourceUnknown,
        };
        warn!(
            "🔄️ Authorisation {}: resource {} does not exist. Failing the authorisation",
            authorisation.authorisation_id, authorisation.parent_id
        );
        self.fail_unprocessed(authorisation, code).await
    }

    /// Fails a non-terminal authorisation without running its state handler. Nothing but the authorisation changes.
    async fn fail_unprocessed(
        &self,
        authorisation: Authorisation,
        code: MessageErrorCode,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError> {
        let response = AuthorisationProcessorResponse::unchanged(&authorisation);
        let response = AuthorisationProcessorResponse { error_code: None, ..response }.failed(code);
        let transition = AuthorisationTransition {
            authorisation_id: authorisation.authorisation_id.clone(),
            expected_version: authorisation.version,
            sca_status: response.sca_status,
            sca_approach: response.sca_approach,
            psu: response.psu.clone(),
            chosen_sca_method: response.chosen_sca_method.clone(),
            available_sca_methods: response.available_sca_methods.clone(),
            error_code: response.error_code,
            resource_status: None,
            session_data: None,
        };
        self.db.commit_transition(transition).await?;
        Ok(response)
    }
}
