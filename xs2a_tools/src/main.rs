use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::*;
use xs2a_engine::EngineConfig;

mod formatting;
mod identifiers;
mod setup;

use crate::{
    identifiers::{decrypt_id, encrypt_id, list_authorisations},
    setup::{migrate_db, MigrateParams},
};

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Utilities for operating the XS2A engine")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the registered crypto providers, and the current defaults
    #[clap(name = "providers")]
    Providers,
    /// Issue an encrypted identifier for an internal consent or payment id, using XS2A_SERVER_KEY
    #[clap(name = "encrypt-id")]
    EncryptId(EncryptIdParams),
    /// Open an encrypted identifier. The payload key is only shown with --reveal
    #[clap(name = "decrypt-id")]
    DecryptId(DecryptIdParams),
    /// List the authorisations of the resource behind an encrypted identifier
    #[clap(name = "authorisations")]
    Authorisations(DecryptIdParams),
    /// Create the database if necessary, and run the migrations
    #[clap(name = "migrate")]
    Migrate(MigrateParams),
}

#[derive(Debug, Args)]
pub struct EncryptIdParams {
    /// The internal id of the consent or payment
    pub internal_id: String,
}

#[derive(Debug, Args)]
pub struct DecryptIdParams {
    /// The encrypted identifier, as handed out to the TPP
    pub encrypted_id: String,
    /// Print the payload key in the clear
    #[arg(long, default_value_t = false)]
    pub reveal: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let result = match cli.command {
        Command::Providers => print_providers(),
        Command::EncryptId(params) => config().and_then(|c| encrypt_id(&c, params)),
        Command::DecryptId(params) => config().and_then(|c| decrypt_id(&c, params)),
        Command::Authorisations(params) => match config() {
            Ok(c) => list_authorisations(&c, params).await,
            Err(e) => Err(e),
        },
        Command::Migrate(params) => migrate_db(params).await,
    };
    if let Err(e) = result {
        error!("🪛️ {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn config() -> Result<EngineConfig> {
    Ok(EngineConfig::try_from_env()?)
}

fn print_providers() -> Result<()> {
    let config = match EngineConfig::try_from_env() {
        Ok(config) => config,
        Err(e) => {
            info!("🪛️ Using the default providers. {e}");
            EngineConfig::new(xs2a_common::Secret::default())
        },
    };
    let registry = config.registry()?;
    println!("{}", formatting::format_providers(&registry));
    Ok(())
}
