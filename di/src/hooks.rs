//! Lifecycle hooks and plugins.
//!
//! One [`HookBus`] is created with each root registry and shared by every
//! level extended from it, so a hook installed anywhere observes the whole
//! tree. Plugins only see payloads; they never get hold of a registry.

use crate::core::{LevelId, Lifecycle};
use crate::error::HookError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  Override,
  Options,
  Constant,
  Factory,
  Service,
  Module,
  Global,
  Undefined,
}

/// What kind of registration a token was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Constant,
  Factory,
  Service,
}

/// A lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
  Extend {
    parent: LevelId,
  },
  Register {
    token: String,
    kind: Kind,
    lifecycle: Lifecycle,
  },
  Resolve {
    token: String,
    source: Source,
    cached: bool,
  },
  ClearCache {
    tokens: Vec<String>,
  },
  Custom {
    name: String,
    data: serde_json::Value,
  },
}

impl HookEvent {
  pub fn name(&self) -> &str {
    match self {
      HookEvent::Extend { .. } => "extend",
      HookEvent::Register { .. } => "register",
      HookEvent::Resolve { .. } => "resolve",
      HookEvent::ClearCache { .. } => "clear_cache",
      HookEvent::Custom { name, .. } => name,
    }
  }
}

/// What a hook callback receives.
#[derive(Debug, Clone, PartialEq)]
pub struct HookPayload {
  /// The level the event was fired from.
  pub level: LevelId,
  pub event_name: String,
  pub event: HookEvent,
}

pub type HookFn = Arc<dyn Fn(&HookPayload) -> Result<(), HookError> + Send + Sync>;

/// Callbacks keyed by event name, kept in registration order.
#[derive(Default)]
pub struct HookBus {
  hooks: RwLock<HashMap<String, Vec<HookFn>>>,
}

impl HookBus {
  pub(crate) fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn on<F>(&self, event_name: &str, callback: F)
  where
    F: Fn(&HookPayload) -> Result<(), HookError> + Send + Sync + 'static,
  {
    self
      .hooks
      .write()
      .entry(event_name.to_string())
      .or_default()
      .push(Arc::new(callback));
  }

  /// Invokes every callback registered for the event, stopping at the first error.
  pub fn trigger(&self, level: LevelId, event: HookEvent) -> Result<(), HookError> {
    // Snapshot so a callback may register further hooks.
    let callbacks = match self.hooks.read().get(event.name()) {
      Some(callbacks) => callbacks.clone(),
      None => return Ok(()),
    };
    let payload = HookPayload {
      level,
      event_name: event.name().to_string(),
      event,
    };
    for callback in callbacks {
      callback(&payload)?;
    }
    Ok(())
  }
}

/// The surface a plugin sees while installing.
pub struct HostApi {
  pub(crate) level: LevelId,
  pub(crate) bus: Arc<HookBus>,
}

impl HostApi {
  pub fn on<F>(&self, event_name: &str, callback: F)
  where
    F: Fn(&HookPayload) -> Result<(), HookError> + Send + Sync + 'static,
  {
    self.bus.on(event_name, callback);
  }

  pub fn trigger(&self, event: HookEvent) -> Result<(), HookError> {
    self.bus.trigger(self.level, event)
  }

  /// The level the plugin is being installed on.
  pub fn level(&self) -> LevelId {
    self.level
  }
}

/// An extension installed with `Registry::use_plugin`.
pub trait Plugin {
  fn name(&self) -> &str;

  /// Registers hooks. An error rejects the installation.
  fn install(&self, host: &HostApi) -> Result<(), String>;
}
