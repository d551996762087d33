use anyhow::{bail, Context};
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Module registry driving the lifecycle of every registered module
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module; lifecycle hooks follow registration order
    pub fn register(&mut self, module: Arc<dyn Module>) {
        tracing::debug!(module = module.name(), "module registered");
        self.modules.push(module);
    }

    /// All registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect all migrations from all modules, ordered by version
    ///
    /// Fails when two migrations share a version.
    pub fn collect_migrations(&self) -> anyhow::Result<Vec<(String, Migration)>> {
        let mut migrations: Vec<(String, Migration)> = self
            .modules
            .iter()
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name().to_string(), migration))
            })
            .collect();

        migrations.sort_by_key(|(_, migration)| migration.version);

        for pair in migrations.windows(2) {
            let ((first_module, first), (second_module, second)) = (&pair[0], &pair[1]);
            if first.version == second.version {
                bail!(
                    "migration version {} is claimed by both '{}' and '{}'",
                    first.version,
                    first_module,
                    second_module
                );
            }
        }

        Ok(migrations)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        versions: Vec<i64>,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl TestModule {
        fn record(&self, event: &str) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.name));
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            Ok(())
        }

        fn migrations(&self) -> Vec<Migration> {
            self.versions
                .iter()
                .map(|&version| Migration {
                    version,
                    description: "test",
                    up: "SELECT 1;",
                })
                .collect()
        }
    }

    fn module(name: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Module> {
        versioned(name, vec![], journal)
    }

    fn versioned(
        name: &'static str,
        versions: Vec<i64>,
        journal: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn Module> {
        Arc::new(TestModule {
            name,
            versions,
            journal: journal.clone(),
        })
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.collect_migrations().unwrap().is_empty());
    }

    #[test]
    fn test_migration_collection_is_sorted_by_version() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(versioned("shelves", vec![3, 1], &journal));
        registry.register(versioned("books", vec![2], &journal));

        let versions: Vec<(String, i64)> = registry
            .collect_migrations()
            .unwrap()
            .into_iter()
            .map(|(module, migration)| (module, migration.version))
            .collect();

        assert_eq!(
            versions,
            vec![
                ("shelves".to_string(), 1),
                ("books".to_string(), 2),
                ("shelves".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_duplicate_migration_versions_are_rejected() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(versioned("books", vec![1], &journal));
        registry.register(versioned("shelves", vec![1], &journal));

        let error = registry.collect_migrations().unwrap_err().to_string();
        assert!(error.contains("version 1"), "{}", error);
    }

    #[test]
    fn test_get_module_by_name() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(module("books", &journal));

        assert!(registry.get_module("books").is_some());
        assert!(registry.get_module("authors").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_module_lifecycle_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(module("a", &journal));
        registry.register(module("b", &journal));

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        registry.init_modules(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();

        let events = journal.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["init:a", "init:b", "start:a", "start:b", "stop:b", "stop:a"]
        );
    }
}
