//! The global namespace consulted when a token is registered nowhere else.

use crate::core::Value;
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// A read-only lookup by exact token name, queried after the registry chain
/// and the module resolver have both missed.
pub trait GlobalScope: Send + Sync {
  fn lookup(&self, name: &str) -> Option<Value>;
}

/// A name-to-value table usable as a [`GlobalScope`].
#[derive(Default)]
pub struct Globals {
  values: DashMap<String, Value>,
}

impl Globals {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self, name: impl Into<String>, value: Value) {
    self.values.insert(name.into(), value);
  }

  pub fn remove(&self, name: &str) -> Option<Value> {
    self.values.remove(name).map(|(_, v)| v)
  }
}

impl GlobalScope for Globals {
  fn lookup(&self, name: &str) -> Option<Value> {
    self.values.get(name).map(|v| v.value().clone())
  }
}

// The process-wide namespace, created on first access.
static GLOBALS: Lazy<Globals> = Lazy::new(Globals::default);

/// Provides a reference to the process-wide global namespace.
///
/// Registries created with `Registry::new()` fall back to it.
///
/// # Examples
///
/// ```
/// use fibre_di::{globals, value, Registry};
///
/// globals().set("app_name", value("fibre"));
///
/// let registry = Registry::new();
/// let name = registry.resolve_as::<&'static str>("app_name").unwrap();
/// assert_eq!(*name, "fibre");
/// ```
pub fn globals() -> &'static Globals {
  &GLOBALS
}

/// Forwards to [`globals()`]; the default scope of a root registry.
pub(crate) struct ProcessGlobals;

impl GlobalScope for ProcessGlobals {
  fn lookup(&self, name: &str) -> Option<Value> {
    globals().lookup(name)
  }
}
