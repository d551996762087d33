//! Startup wiring: storage selection, module registry, migrations and the
//! server lifecycle.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sqlx::PgPool;

use bookshelf_kernel::{
    settings::{DatabaseDriver, Settings},
    InitCtx, ModuleRegistry,
};

use crate::modules::{
    self,
    books::repository::{InMemoryBookRepository, PgBookRepository, SharedBookRepository},
};

/// Services built once at startup and handed to modules.
pub struct AppContext {
    pub settings: Settings,
    /// Present with the postgres driver
    pub pool: Option<PgPool>,
    pub books: SharedBookRepository,
}

impl AppContext {
    /// Build the context for the configured database driver.
    pub async fn connect(settings: Settings) -> anyhow::Result<Self> {
        match settings.database.driver {
            DatabaseDriver::Postgres => {
                let pool = bookshelf_db::connect(&settings.database).await?;
                let books: SharedBookRepository = Arc::new(PgBookRepository::new(pool.clone()));
                Ok(Self {
                    settings,
                    pool: Some(pool),
                    books,
                })
            }
            DatabaseDriver::Memory => {
                tracing::warn!("using the in-memory book repository; books are lost on exit");
                Ok(Self::in_memory(settings))
            }
        }
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self::with_repository(settings, Arc::new(InMemoryBookRepository::new()))
    }

    pub fn with_repository(settings: Settings, books: SharedBookRepository) -> Self {
        Self {
            settings,
            pool: None,
            books,
        }
    }

    pub fn registry(&self) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, self);
        registry
    }

    /// Fully assembled HTTP router over this context.
    pub fn router(&self) -> Router {
        bookshelf_http::build_router(&self.registry(), &self.settings)
    }

    /// Apply pending module migrations. A no-op without a database pool.
    pub async fn migrate(&self, registry: &ModuleRegistry) -> anyhow::Result<()> {
        let Some(pool) = &self.pool else {
            tracing::info!("no database pool; skipping migrations");
            return Ok(());
        };

        let migrations = registry.collect_migrations()?;
        bookshelf_db::run_migrations(pool, &migrations)
            .await
            .context("failed to run migrations")?;
        tracing::info!(modules = registry.len(), "migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Connect, migrate, run the modules and serve HTTP until shutdown.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let ctx = AppContext::connect(settings).await?;
    let registry = ctx.registry();
    ctx.migrate(&registry).await?;

    let init = InitCtx {
        settings: &ctx.settings,
    };
    registry.init_modules(&init).await?;
    registry.start_modules(&init).await?;

    let served = bookshelf_http::start_server(&registry, &ctx.settings).await;
    shut_down(&ctx, &registry, served).await
}

/// Stop the modules and close the pool whatever the server returned.
///
/// A server error takes precedence over a stop error.
async fn shut_down(
    ctx: &AppContext,
    registry: &ModuleRegistry,
    served: anyhow::Result<()>,
) -> anyhow::Result<()> {
    let stopped = registry.stop_modules().await;
    if let Err(error) = &stopped {
        tracing::error!(error = %format!("{:#}", error), "failed to stop modules");
    }
    ctx.close().await;
    served.and(stopped)
}

/// Connect and apply pending migrations, then exit.
pub async fn migrate(settings: Settings) -> anyhow::Result<()> {
    let ctx = AppContext::connect(settings).await?;
    let applied = ctx.migrate(&ctx.registry()).await;
    ctx.close().await;
    applied
}
