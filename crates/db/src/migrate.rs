//! Module migrations applied through sqlx's migrator.
//!
//! sqlx records every applied version with a checksum in `_sqlx_migrations`
//! and holds a PostgreSQL advisory lock while it runs, so concurrent
//! instances apply each migration once and edited migrations are refused.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use sqlx::error::BoxDynError;
use sqlx::migrate::{Migration as SqlxMigration, MigrationSource, MigrationType, Migrator};
use sqlx::PgPool;

use bookshelf_kernel::Migration;

/// Module-provided migrations as a sqlx migration source.
#[derive(Debug)]
pub struct ModuleMigrations(Vec<SqlxMigration>);

impl ModuleMigrations {
    pub fn new(migrations: &[(String, Migration)]) -> Self {
        let mut resolved: Vec<SqlxMigration> = migrations
            .iter()
            .map(|(module, migration)| {
                SqlxMigration::new(
                    migration.version,
                    Cow::Owned(format!("{} {}", module, migration.description)),
                    MigrationType::Simple,
                    Cow::Borrowed(migration.up),
                    false,
                )
            })
            .collect();
        resolved.sort_by_key(|migration| migration.version);
        Self(resolved)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SqlxMigration> {
        self.0.iter()
    }
}

impl MigrationSource<'static> for ModuleMigrations {
    fn resolve(
        self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SqlxMigration>, BoxDynError>> + Send + 'static>>
    {
        Box::pin(async move { Ok(self.0) })
    }
}

/// Apply every module migration the database has not seen yet.
pub async fn run_migrations(pool: &PgPool, migrations: &[(String, Migration)]) -> anyhow::Result<()> {
    let migrator = Migrator::new(ModuleMigrations::new(migrations))
        .await
        .context("failed to resolve module migrations")?;

    migrator
        .run(pool)
        .await
        .context("failed to apply migrations")?;

    tracing::info!(
        target: "bookshelf-db",
        known = migrator.iter().count(),
        "schema is up to date"
    );
    Ok(())
}
