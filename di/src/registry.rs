//! The inheritable registry: registrations, per-level caches, config and hooks.

use crate::args::Args;
use crate::config::Config;
use crate::core::{value, LevelId, Lifecycle, Value};
use crate::declarator::{Declaration, Descriptor};
use crate::error::{HookError, PluginInstallError, ResolveError, Result};
use crate::global::{GlobalScope, ProcessGlobals};
use crate::hooks::{HookBus, HookEvent, HookPayload, HostApi, Kind, Plugin};
use crate::modules::{ModuleResolver, NoModules};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// A registered callable. Factories and services share this shape.
pub type Callable = Arc<dyn Fn(&Args) -> Result<Value> + Send + Sync>;

pub(crate) enum Payload {
  Constant(Value),
  Factory(Callable),
  Service {
    ctor: Callable,
    parent: Option<String>,
  },
}

/// Describes how to produce a token's value. Handed to [`Registry::register`].
pub struct Provider {
  payload: Payload,
  declaration: Declaration,
  lifecycle: Option<Lifecycle>,
}

impl Provider {
  pub fn constant(v: Value) -> Self {
    Self {
      payload: Payload::Constant(v),
      declaration: Declaration::None,
      lifecycle: None,
    }
  }

  pub fn factory<T, F>(deps: impl Into<Declaration>, f: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
  {
    Self {
      payload: Payload::Factory(Arc::new(move |args: &Args| f(args).map(value))),
      declaration: deps.into(),
      lifecycle: None,
    }
  }

  /// A service is built from its named parameters (see [`Args::named`]) and
  /// may chain to one parent service with [`Provider::extends`].
  pub fn service<T, F>(deps: impl Into<Declaration>, ctor: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
  {
    Self {
      payload: Payload::Service {
        ctor: Arc::new(move |args: &Args| ctor(args).map(value)),
        parent: None,
      },
      declaration: deps.into(),
      lifecycle: None,
    }
  }

  /// Invokes the `parent` service before this one. Has no effect on
  /// constants and factories.
  pub fn extends(mut self, parent: impl Into<String>) -> Self {
    if let Payload::Service { parent: slot, .. } = &mut self.payload {
      *slot = Some(parent.into());
    }
    self
  }

  pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
    self.lifecycle = Some(lifecycle);
    self
  }
}

pub(crate) struct Registration {
  pub(crate) token: String,
  pub(crate) payload: Payload,
  declaration: Declaration,
  descriptor: OnceCell<Descriptor>,
  pub(crate) lifecycle: Lifecycle,
}

impl Registration {
  pub(crate) fn kind(&self) -> Kind {
    match self.payload {
      Payload::Constant(_) => Kind::Constant,
      Payload::Factory(_) => Kind::Factory,
      Payload::Service { .. } => Kind::Service,
    }
  }

  /// The dependency list, materialized on first use.
  pub(crate) fn descriptor(&self) -> &Descriptor {
    self
      .descriptor
      .get_or_init(|| Descriptor::from_declaration(&self.declaration))
  }

  pub(crate) fn callable(&self) -> Callable {
    match &self.payload {
      Payload::Constant(v) => {
        let v = v.clone();
        Arc::new(move |_: &Args| Ok(v.clone()))
      }
      Payload::Factory(f) => f.clone(),
      Payload::Service { ctor, .. } => ctor.clone(),
    }
  }
}

/// A memoized value, valid only for the registration it was built from.
struct CacheSlot {
  registration: Arc<Registration>,
  cell: Arc<OnceCell<Value>>,
}

impl CacheSlot {
  fn new(registration: &Arc<Registration>) -> Self {
    Self {
      registration: registration.clone(),
      cell: Arc::new(OnceCell::new()),
    }
  }
}

struct Level {
  id: LevelId,
  parent: Option<Arc<Level>>,
  registrations: DashMap<String, Arc<Registration>>,
  cache: DashMap<String, CacheSlot>,
  config: Config,
  hooks: Arc<HookBus>,
  modules: Arc<dyn ModuleResolver>,
  globals: Arc<dyn GlobalScope>,
}

impl Level {
  fn ancestry(&self) -> impl Iterator<Item = &Level> {
    std::iter::successors(Some(self), |&level| level.parent.as_deref())
  }
}

/// Builds a root [`Registry`] with custom collaborators.
pub struct RegistryBuilder {
  config: Config,
  modules: Arc<dyn ModuleResolver>,
  globals: Arc<dyn GlobalScope>,
}

impl RegistryBuilder {
  pub fn config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  pub fn modules(mut self, modules: Arc<dyn ModuleResolver>) -> Self {
    self.modules = modules;
    self
  }

  pub fn globals(mut self, globals: Arc<dyn GlobalScope>) -> Self {
    self.globals = globals;
    self
  }

  pub fn build(self) -> Registry {
    let level = Level {
      id: LevelId::next(),
      parent: None,
      registrations: DashMap::new(),
      cache: DashMap::new(),
      config: self.config,
      hooks: HookBus::new(),
      modules: self.modules,
      globals: self.globals,
    };
    debug!(level = %level.id, "created root registry");
    Registry {
      level: Arc::new(level),
    }
  }
}

/// One level of a registry chain.
///
/// Reads fall through to ancestors when a token is absent locally. Writes
/// (registration, cache clearing) only ever touch this level, shadowing
/// the parent rather than mutating it. Each level memoizes the values it
/// resolved itself, since a child may shadow the dependencies of a factory
/// its parent registered. Cloning yields another handle to the same level.
#[derive(Clone)]
pub struct Registry {
  level: Arc<Level>,
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}

impl Registry {
  /// A root registry with no platform modules, backed by the process-wide [`globals()`](crate::globals).
  pub fn new() -> Self {
    Self::builder().build()
  }

  pub fn builder() -> RegistryBuilder {
    RegistryBuilder {
      config: Config::default(),
      modules: Arc::new(NoModules),
      globals: Arc::new(ProcessGlobals),
    }
  }

  /// Creates a child level reading through to this one.
  pub fn extend(&self, config: Config) -> Result<Registry, HookError> {
    let level = Level {
      id: LevelId::next(),
      parent: Some(self.level.clone()),
      registrations: DashMap::new(),
      cache: DashMap::new(),
      config,
      hooks: self.level.hooks.clone(),
      modules: self.level.modules.clone(),
      globals: self.level.globals.clone(),
    };
    let child = Registry {
      level: Arc::new(level),
    };
    debug!(level = %child.id(), parent = %self.id(), "extended registry");
    child.trigger(HookEvent::Extend { parent: self.id() })?;
    Ok(child)
  }

  pub fn id(&self) -> LevelId {
    self.level.id
  }

  pub fn parent(&self) -> Option<Registry> {
    self
      .level
      .parent
      .clone()
      .map(|level| Registry { level })
  }

  // --- Registration ---

  /// Stores a registration on this level, replacing any local one for the token.
  pub fn register(&self, token: &str, provider: Provider) -> Result<(), HookError> {
    let lifecycle = provider
      .lifecycle
      .or_else(|| self.setting(|c| c.lifecycle))
      .unwrap_or_default();
    let registration = Registration {
      token: token.to_string(),
      payload: provider.payload,
      declaration: provider.declaration,
      descriptor: OnceCell::new(),
      lifecycle,
    };
    let kind = registration.kind();
    self
      .level
      .registrations
      .insert(token.to_string(), Arc::new(registration));

    debug!(level = %self.id(), token, ?kind, ?lifecycle, "registered");
    self.trigger(HookEvent::Register {
      token: token.to_string(),
      kind,
      lifecycle,
    })
  }

  pub fn constant<T: Any + Send + Sync>(&self, token: &str, v: T) -> Result<(), HookError> {
    self.register(token, Provider::constant(value(v)))
  }

  pub fn factory<T, F>(&self, token: &str, deps: impl Into<Declaration>, f: F) -> Result<(), HookError>
  where
    T: Any + Send + Sync,
    F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
  {
    self.register(token, Provider::factory(deps, f))
  }

  pub fn service<T, F>(&self, token: &str, deps: impl Into<Declaration>, ctor: F) -> Result<(), HookError>
  where
    T: Any + Send + Sync,
    F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
  {
    self.register(token, Provider::service(deps, ctor))
  }

  /// Whether the token is registered on this level or an ancestor.
  pub fn contains(&self, token: &str) -> bool {
    self.find(token).is_some()
  }

  /// The registered callable for a token, without resolving anything.
  ///
  /// Constants yield a callable returning the constant. Platform modules and
  /// globals are not consulted.
  pub fn raw(&self, token: &str) -> Result<Callable> {
    self
      .find(token)
      .map(|registration| registration.callable())
      .ok_or_else(|| ResolveError::NotFound {
        token: token.to_string(),
        path: Vec::new(),
      })
  }

  // --- Cache ---

  /// Drops cached values of the given tokens on this level, or every value
  /// this level cached when `tokens` is empty. Ancestors and children keep
  /// their caches.
  ///
  /// The `clear_cache` event carries the requested tokens, or the dropped
  /// ones when none were named.
  pub fn clear_cache(&self, tokens: &[&str]) -> Result<(), HookError> {
    let mut cleared: Vec<String> = if tokens.is_empty() {
      self.level.cache.iter().map(|entry| entry.key().clone()).collect()
    } else {
      tokens.iter().map(|token| token.to_string()).collect()
    };
    self
      .level
      .cache
      .retain(|token, _| !(tokens.is_empty() || tokens.contains(&token.as_str())));
    cleared.sort();
    cleared.dedup();

    debug!(level = %self.id(), tokens = ?cleared, "cleared cache");
    self.trigger(HookEvent::ClearCache { tokens: cleared })
  }

  // --- Hooks and plugins ---

  /// Registers a hook. Hooks are shared by the whole registry tree.
  pub fn on<F>(&self, event_name: &str, callback: F)
  where
    F: Fn(&HookPayload) -> Result<(), HookError> + Send + Sync + 'static,
  {
    self.level.hooks.on(event_name, callback);
  }

  /// Fires an event from this level.
  pub fn trigger(&self, event: HookEvent) -> Result<(), HookError> {
    self.level.hooks.trigger(self.id(), event)
  }

  pub fn use_plugin(&self, plugin: &dyn Plugin) -> Result<(), PluginInstallError> {
    let host = HostApi {
      level: self.id(),
      bus: self.level.hooks.clone(),
    };
    plugin.install(&host).map_err(|reason| PluginInstallError {
      plugin: plugin.name().to_string(),
      reason,
    })?;
    debug!(level = %self.id(), plugin = plugin.name(), "installed plugin");
    Ok(())
  }

  // --- Internals used by the resolver ---

  pub(crate) fn find(&self, token: &str) -> Option<Arc<Registration>> {
    self
      .level
      .ancestry()
      .find_map(|level| level.registrations.get(token).map(|r| r.value().clone()))
  }

  /// This level's cache cell for a registration, found locally or in an
  /// ancestor. A cell left over from a replaced registration is discarded.
  pub(crate) fn cache_slot(&self, registration: &Arc<Registration>) -> Arc<OnceCell<Value>> {
    let mut slot = self
      .level
      .cache
      .entry(registration.token.clone())
      .or_insert_with(|| CacheSlot::new(registration));
    if !Arc::ptr_eq(&slot.registration, registration) {
      *slot = CacheSlot::new(registration);
    }
    slot.cell.clone()
  }

  /// The nearest explicitly set value of a config field.
  pub(crate) fn setting<T>(&self, field: impl Fn(&Config) -> Option<T>) -> Option<T> {
    self.level.ancestry().find_map(|level| field(&level.config))
  }

  pub(crate) fn modules(&self) -> &dyn ModuleResolver {
    self.level.modules.as_ref()
  }

  pub(crate) fn globals(&self) -> &dyn GlobalScope {
    self.level.globals.as_ref()
  }
}
