use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{Authorisation, AuthorisationKind, NewAuthorisation, PsuIdData, ScaApproach},
    security::IdentifierEncryptionService,
    traits::{AuthorisationManagement, ResourceManagement},
    xs2a_api::errors::AuthorisationApiError,
};

pub const DEFAULT_AUTHORISATION_TTL_MINUTES: i64 = 30;

/// `AuthorisationApi` starts SCA authorisations for registered resources, and reports on them.
///
/// Progressing an authorisation through SCA is the job of [`crate::sca::AuthorisationStateDispatcher`].
pub struct AuthorisationApi<B> {
    db: B,
    identifiers: IdentifierEncryptionService,
    ttl: Duration,
}

impl<B> Debug for AuthorisationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthorisationApi")
    }
}

impl<B> AuthorisationApi<B> {
    pub fn new(db: B, identifiers: IdentifierEncryptionService) -> Self {
        Self { db, identifiers, ttl: Duration::minutes(DEFAULT_AUTHORISATION_TTL_MINUTES) }
    }

    /// Sets how long new authorisations stay valid.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl<B> AuthorisationApi<B>
where B: AuthorisationManagement + ResourceManagement
{
    /// Creates an authorisation for the resource behind `encrypted_id`.
    ///
    /// The authorisation starts in `RECEIVED` for the embedded and decoupled approaches, and in `STARTED` for redirect
    /// and OAuth. Resources that are already decided (see [`AuthorisationKind::can_start_on`]) are refused with
    /// [`AuthorisationApiError::ResourceClosed`].
    pub async fn start_authorisation(
        &self,
        encrypted_id: &str,
        kind: AuthorisationKind,
        sca_approach: ScaApproach,
        psu: PsuIdData,
    ) -> Result<Authorisation, AuthorisationApiError> {
        let decrypted =
            self.identifiers.decrypt_identifier(encrypted_id).ok_or(AuthorisationApiError::InvalidIdentifier)?;
        let resource =
            self.db.fetch_resource(&decrypted.internal_id).await?.ok_or(AuthorisationApiError::ResourceNotFound)?;
        if kind.service_type() != resource.service_type {
            return Err(AuthorisationApiError::KindMismatch { kind, service_type: resource.service_type });
        }
        if !kind.can_start_on(resource.status) {
            warn!("🔄️ Refusing to start a {kind} authorisation for {}. It is {}", resource.internal_id, resource.status);
            return Err(AuthorisationApiError::ResourceClosed { kind, status: resource.status });
        }
        let authorisation = NewAuthorisation {
            authorisation_id: uuid::Uuid::new_v4().to_string(),
            parent_id: resource.internal_id,
            authorisation_kind: kind,
            sca_approach,
            psu,
            expires_at: Utc::now() + self.ttl,
        };
        let authorisation = self.db.insert_authorisation(authorisation).await?;
        info!(
            "🔄️ {kind} authorisation {} started for {} in status {}",
            authorisation.authorisation_id, authorisation.parent_id, authorisation.sca_status
        );
        Ok(authorisation)
    }

    pub async fn fetch_authorisation(&self, authorisation_id: &str) -> Result<Option<Authorisation>, AuthorisationApiError> {
        Ok(self.db.fetch_authorisation(authorisation_id).await?)
    }

    /// All authorisations started for the resource behind `encrypted_id`, oldest first.
    pub async fn fetch_authorisations_for_resource(
        &self,
        encrypted_id: &str,
    ) -> Result<Vec<Authorisation>, AuthorisationApiError> {
        let decrypted =
            self.identifiers.decrypt_identifier(encrypted_id).ok_or(AuthorisationApiError::InvalidIdentifier)?;
        Ok(self.db.fetch_authorisations_for_resource(&decrypted.internal_id).await?)
    }
}
