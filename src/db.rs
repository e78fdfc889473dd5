use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Open the scheduler database and bring the schema up to date. The schema
/// relies on foreign keys (slots and appointments reference accounts and
/// lots), so enforcement is switched on for every connection.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let migration_sql = include_str!("../migrations/001_initial.sql");
    sqlx::raw_sql(migration_sql).execute(&pool).await?;

    Ok(pool)
}
