use std::path::Path;

use anyhow::Result;
use clap::Args;
use sqlx::{
    migrate::{MigrateDatabase, Migrator},
    Sqlite,
};
use xs2a_engine::{sqlite::db::db_url, SqliteDatabase};

#[derive(Debug, Args)]
pub struct MigrateParams {
    /// The path to the migrations directory. The migrations are embedded in the binary by default, and so this
    /// parameter is optional. If provided, the migrations at <path> will be executed instead.
    #[arg(short, long)]
    pub path: Option<String>,
}

pub async fn migrate_db(params: MigrateParams) -> Result<()> {
    async fn migrate_embedded() -> Result<()> {
        create_database_if_not_exist().await?;
        println!("Running embedded migrations");
        let db = SqliteDatabase::new(1).await?;
        sqlx::migrate!("../xs2a_engine/src/sqlite/migrations").run(db.pool()).await?;
        Ok(())
    }

    async fn migrate_custom(path: &str) -> Result<()> {
        create_database_if_not_exist().await?;
        println!("Running migrations at: {path}");
        let db = SqliteDatabase::new(1).await?;
        let migrator = Migrator::new(Path::new(path)).await?;
        migrator.run(db.pool()).await?;
        Ok(())
    }

    match &params.path {
        Some(path) => migrate_custom(path).await?,
        None => migrate_embedded().await?,
    }
    println!("Migrations complete");
    Ok(())
}

async fn create_database_if_not_exist() -> Result<()> {
    let db = db_url();
    if !Sqlite::database_exists(&db).await? {
        println!("Creating new database at: {db}");
        Sqlite::create_database(&db).await?;
    }
    Ok(())
}
