//! Native-module registry.
//!
//! `import name` consults this registry: a registered initializer is
//! called once to build the Module value, which is then cached so every
//! import of the same name yields the same object.

pub mod math;

use rill_core::Value;
use rustc_hash::FxHashMap;

/// A native module initializer.
pub type ModuleInit = fn() -> Value;

/// Registry mapping module names to native initializers.
pub struct ModuleRegistry {
    initializers: FxHashMap<String, ModuleInit>,
    loaded: FxHashMap<String, Value>,
}

impl ModuleRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initializers: FxHashMap::default(),
            loaded: FxHashMap::default(),
        }
    }

    /// The registry with the standard modules installed.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("math", math::init);
        registry
    }

    /// Register a native module initializer.
    pub fn register(&mut self, name: impl Into<String>, init: ModuleInit) {
        self.initializers.insert(name.into(), init);
    }

    /// Resolve a module, initializing and caching it on first use.
    pub fn resolve(&mut self, name: &str) -> Option<Value> {
        if let Some(module) = self.loaded.get(name) {
            return Some(module.clone());
        }
        let init = self.initializers.get(name)?;
        let module = init();
        self.loaded.insert(name.to_string(), module.clone());
        Some(module)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
