//! Platform modules: values the host environment can load by name.

use crate::core::Value;
use dashmap::DashMap;

/// Loads a platform module by exact name.
///
/// Lookups must be synchronous and idempotent. A successful load is
/// registered as a constant on the level that asked for it, so the resolver
/// never asks twice for the same name on that level.
pub trait ModuleResolver: Send + Sync {
  fn try_load(&self, name: &str) -> Option<Value>;
}

/// A resolver that never finds anything.
pub struct NoModules;

impl ModuleResolver for NoModules {
  fn try_load(&self, _name: &str) -> Option<Value> {
    None
  }
}

/// A fixed table of named loaders.
#[derive(Default)]
pub struct StaticModules {
  loaders: DashMap<String, Box<dyn Fn() -> Value + Send + Sync>>,
}

impl StaticModules {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(self, name: impl Into<String>, loader: impl Fn() -> Value + Send + Sync + 'static) -> Self {
    self.loaders.insert(name.into(), Box::new(loader));
    self
  }
}

impl ModuleResolver for StaticModules {
  fn try_load(&self, name: &str) -> Option<Value> {
    let loader = self.loaders.get(name)?;
    Some((loader.value())())
  }
}
