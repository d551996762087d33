//! PostgreSQL connectivity for the bookshelf service.

use std::str::FromStr;

use anyhow::{bail, Context};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use bookshelf_kernel::settings::DatabaseSettings;

pub mod migrate;

pub use migrate::{run_migrations, ModuleMigrations};

/// Connection options for the configured database.
///
/// `database.url` wins when set; otherwise the options are assembled from the
/// individual fields, so credentials are never spliced into a string.
pub fn connect_options(settings: &DatabaseSettings) -> anyhow::Result<PgConnectOptions> {
    if let Some(url) = &settings.url {
        return PgConnectOptions::from_str(url)
            .context("database.url is not a valid PostgreSQL connection string");
    }

    if !settings.is_postgres() {
        bail!(
            "unsupported database dialect '{}'; expected postgresql",
            settings.dialect
        );
    }

    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .database(&settings.name);
    if let Some(user) = &settings.user {
        options = options.username(user);
    }
    if let Some(password) = &settings.password {
        options = options.password(password);
    }
    Ok(options)
}

/// Open a connection pool against the configured database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let options = connect_options(settings)?;
    let target = describe(&options);
    tracing::info!(
        target: "bookshelf-db",
        host = options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or_default(),
        user = options.get_username(),
        max_connections = settings.max_connections,
        "connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to {}", target))
}

/// `user@host:port/database`, safe to log.
fn describe(options: &PgConnectOptions) -> String {
    format!(
        "{}@{}:{}/{}",
        options.get_username(),
        options.get_host(),
        options.get_port(),
        options.get_database().unwrap_or_default()
    )
}
