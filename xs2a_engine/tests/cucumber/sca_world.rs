use std::{collections::HashMap, sync::Arc};

use cucumber::World;
use log::*;
use xs2a_common::Secret;
use xs2a_engine::{
    db_types::Authorisation,
    sca::AuthorisationProcessorResponse,
    security::{ConsentDataCodec, EncryptedIdentifier},
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        ScriptedSpi,
    },
    AuthorisationApi,
    AuthorisationStateDispatcher,
    EngineConfig,
    ResourceApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct ScaWorld {
    pub system: Option<ScaSystem>,
    /// Encrypted identifiers by internal id
    pub identifiers: HashMap<String, EncryptedIdentifier>,
    /// The most recently started authorisation
    pub authorisation: Option<Authorisation>,
    pub last_response: Option<AuthorisationProcessorResponse>,
}

#[derive(Debug)]
pub struct ScaSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub codec: ConsentDataCodec,
    pub spi: Arc<ScriptedSpi>,
    pub dispatcher: AuthorisationStateDispatcher<SqliteDatabase, ScriptedSpi>,
}

impl ScaWorld {
    pub fn system(&self) -> &ScaSystem {
        self.system.as_ref().expect("SCA system not initialised")
    }

    pub fn authorisation(&self) -> &Authorisation {
        self.authorisation.as_ref().expect("No authorisation has been started")
    }

    pub fn response(&self) -> &AuthorisationProcessorResponse {
        self.last_response.as_ref().expect("No update has been sent")
    }

    pub fn identifier(&self, internal_id: &str) -> &EncryptedIdentifier {
        self.identifiers.get(internal_id).unwrap_or_else(|| panic!("{internal_id} has not been registered"))
    }
}

impl ScaSystem {
    pub async fn new(config: EngineConfig) -> Self {
        let db_path = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&db_path, 1).await.expect("Error creating connection to database");
        debug!("Created database: {db_path}");
        let codec = config.codec().expect("Invalid configuration");
        let spi = Arc::new(ScriptedSpi::new());
        let dispatcher = AuthorisationStateDispatcher::new(db.clone(), spi.clone(), codec.clone())
            .with_settings(config.sca_settings());
        Self { db_path, db, codec, spi, dispatcher }
    }

    pub fn resources(&self) -> ResourceApi<SqliteDatabase> {
        ResourceApi::new(self.db.clone(), self.codec.clone())
    }

    pub fn authorisations(&self) -> AuthorisationApi<SqliteDatabase> {
        AuthorisationApi::new(self.db.clone(), self.codec.identifiers().clone())
    }
}

pub fn default_config() -> EngineConfig {
    EngineConfig::new(Secret::new("cucumber server secret".to_string()))
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
