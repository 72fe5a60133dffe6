//! Engine facade: registry, collaborators and a cache of override chains

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::data::PageData;
use crate::hooks::{HookDispatcher, NoHooks};
use crate::render::{RenderConfig, Renderer};
use crate::sanitize::{Sanitizer, Verbatim};
use crate::template::{build_chain, template_chain, OverrideChain, TemplateRegistry};
use crate::RenderError;

/// Renders templates from one registry, reusing override chains across calls.
///
/// Chains are keyed by leaf template and shared as `Arc`s, so any number of
/// threads can render through one engine.
pub struct Engine {
    registry: TemplateRegistry,
    hooks: Box<dyn HookDispatcher>,
    sanitizer: Box<dyn Sanitizer>,
    config: RenderConfig,
    chains: RwLock<HashMap<String, Arc<OverrideChain>>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("templates", &self.registry.len())
            .field("cached_chains", &self.cached_chains())
            .field("config", &self.config)
            .finish()
    }
}

impl Engine {
    pub fn new(registry: TemplateRegistry) -> Self {
        Self {
            registry,
            hooks: Box::new(NoHooks),
            sanitizer: Box::new(Verbatim),
            config: RenderConfig::default(),
            chains: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_hooks(mut self, hooks: impl HookDispatcher + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Override chain for `leaf`, built on first use
    pub fn chain(&self, leaf: &str) -> Result<Arc<OverrideChain>, RenderError> {
        if let Some(chain) = self
            .chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(leaf)
        {
            return Ok(Arc::clone(chain));
        }

        let templates = template_chain(&self.registry, leaf)?;
        let chain = Arc::new(build_chain(&self.registry, &templates)?);
        self.chains
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(leaf.to_string(), Arc::clone(&chain));
        Ok(chain)
    }

    /// Render the template `leaf` against `data`
    pub fn render(&self, leaf: &str, data: &dyn PageData) -> Result<String, RenderError> {
        let chain = self.chain(leaf)?;
        Renderer::new(&chain, &self.config)
            .with_hooks(self.hooks.as_ref())
            .with_sanitizer(self.sanitizer.as_ref())
            .render(data)
    }

    /// Drop every cached chain that uses `template`, as a parent or an include
    pub fn invalidate(&self, template: &str) {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        let before = chains.len();
        chains.retain(|_, chain| {
            !chain.templates().contains(template) && chain.include_root(template).is_none()
        });
        debug!(template, dropped = before - chains.len(), "invalidated override chains");
    }

    /// Swap in a freshly loaded registry; every cached chain is dropped
    pub fn replace_registry(&mut self, registry: TemplateRegistry) {
        self.registry = registry;
        self.chains
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn cached_chains(&self) -> usize {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
