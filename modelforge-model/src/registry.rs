//! Contract registry.
//!
//! The registry maps a contract identity to its compiled descriptor and
//! factory. Lookups take a read lock on the published map; builds serialize
//! on a single registry-wide lock and re-check the map once they hold it, so
//! each identity is compiled at most once even with concurrent callers.
//! Failed builds publish nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use modelforge_schema::{ContractDef, SchemaDescriptor};
use modelforge_types::{DefaultConverter, TypeConverter};
use tracing::{debug, trace, warn};

use crate::{ModelConfig, ModelError, ModelFactory, ModelResult};

pub(crate) struct RegistryInner {
    pub(crate) config: ModelConfig,
    pub(crate) converter: Arc<dyn TypeConverter>,
    /// Known definitions, compiled or not.
    contracts: RwLock<HashMap<String, ContractDef>>,
    published: RwLock<HashMap<String, ModelFactory>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

/// Shared handle to a contract cache.
///
/// Cloning the handle shares the cache. Factories keep only a weak reference
/// back to their registry, so nested and polymorphic contracts stop resolving
/// once every handle has been dropped.
#[derive(Clone)]
pub struct ModelRegistry {
    inner: Arc<RegistryInner>,
}

impl ModelRegistry {
    /// Creates an empty registry using the built-in conversion service.
    pub fn new(config: ModelConfig) -> Self {
        Self::with_converter(config, Arc::new(DefaultConverter))
    }

    /// Creates an empty registry with a custom conversion service for
    /// raw-map construction.
    pub fn with_converter(config: ModelConfig, converter: Arc<dyn TypeConverter>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                converter,
                contracts: RwLock::new(HashMap::new()),
                published: RwLock::new(HashMap::new()),
                build_lock: Mutex::new(()),
                builds: AtomicUsize::new(0),
            }),
        }
    }

    /// The process-wide default registry.
    pub fn global() -> &'static ModelRegistry {
        static GLOBAL: OnceLock<ModelRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ModelRegistry::default)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.inner.config
    }

    /// Returns the compiled descriptor and factory for `contract`, building
    /// and publishing them on first use.
    ///
    /// A later call with a different definition under an already published
    /// identity returns the published pair and logs a warning. Leading and
    /// trailing whitespace in the identity is ignored.
    ///
    /// The returned factory holds only a weak handle to this registry. Keep
    /// the registry alive for as long as the factory decodes or constructs
    /// nested and polymorphic models; once it is dropped those operations
    /// fail with [`ModelError::RegistryDropped`]. Factories from
    /// [`global`](Self::global) never hit this.
    pub fn get_or_build(&self, contract: &ContractDef) -> ModelResult<(Arc<SchemaDescriptor>, ModelFactory)> {
        // Compilation trims the identity; every map is keyed the same way.
        let identity = contract.name.trim();
        if let Some(factory) = self.published(identity) {
            trace!(contract = %identity, "registry cache hit");
            self.check_definition(identity, contract);
            return Ok((Arc::clone(factory.descriptor()), factory));
        }

        let _guard = self.inner.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(factory) = self.published(identity) {
            trace!(contract = %identity, "contract published while waiting for build lock");
            self.check_definition(identity, contract);
            return Ok((Arc::clone(factory.descriptor()), factory));
        }

        let descriptor = Arc::new(SchemaDescriptor::compile(contract)?);
        let factory = ModelFactory::new(Arc::clone(&descriptor), &self.inner);
        self.inner
            .contracts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(descriptor.identity().to_string(), contract.clone());
        self.inner
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(descriptor.identity().to_string(), factory.clone());
        let builds = self.inner.builds.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            contract = %descriptor.identity(),
            properties = descriptor.len(),
            builds,
            "built contract"
        );
        Ok((descriptor, factory))
    }

    /// Records a definition without compiling it, so that nested and
    /// polymorphic references to it can be resolved later. Replaces an
    /// earlier unpublished definition of the same identity.
    pub fn register(&self, contract: ContractDef) {
        let identity = contract.name.trim().to_string();
        if self.published(&identity).is_some() {
            self.check_definition(&identity, &contract);
            return;
        }
        self.inner
            .contracts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity, contract);
    }

    /// Parses a contract document and registers it.
    pub fn register_json(&self, json: &str) -> ModelResult<()> {
        self.register(ContractDef::from_json(json)?);
        Ok(())
    }

    /// Returns the factory for a registered identity, compiling it on first
    /// use.
    pub fn resolve(&self, identity: &str) -> ModelResult<ModelFactory> {
        let identity = identity.trim();
        if let Some(factory) = self.published(identity) {
            return Ok(factory);
        }
        let contract = self
            .inner
            .contracts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
            .ok_or_else(|| ModelError::UnknownContract(identity.to_string()))?;
        self.get_or_build(&contract).map(|(_, factory)| factory)
    }

    /// Returns the factory for an already published identity.
    pub fn factory(&self, identity: &str) -> Option<ModelFactory> {
        self.published(identity.trim())
    }

    /// Number of published contracts.
    pub fn len(&self) -> usize {
        self.inner.published.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful compilations since the registry was created.
    pub fn build_count(&self) -> usize {
        self.inner.builds.load(Ordering::Relaxed)
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn converter(&self) -> &dyn TypeConverter {
        self.inner.converter.as_ref()
    }

    fn published(&self, identity: &str) -> Option<ModelFactory> {
        self.inner
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    fn check_definition(&self, identity: &str, contract: &ContractDef) {
        let contracts = self.inner.contracts.read().unwrap_or_else(PoisonError::into_inner);
        if contracts.get(identity).is_some_and(|known| known != contract) {
            warn!(
                contract = %identity,
                "definition differs from the published contract; keeping the published one"
            );
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("published", &self.len())
            .field("builds", &self.build_count())
            .finish_non_exhaustive()
    }
}
