//! Token resolution.
//!
//! Sources are consulted in a fixed order: per-call overrides, the registry
//! chain (local level first), the platform module resolver, then the global
//! namespace. Dependencies are resolved depth first, each one fully resolved
//! (and cached) before the callable that needs it runs.
//!
//! Optional resolutions read the cache but never write it, so a value built
//! around a swallowed failure cannot leak into a later required resolution.

use crate::args::Args;
use crate::core::{
  downcast, parse_token, Lifecycle, ResolutionGuard, ResolutionStack, Value, OPTIONS_TOKEN,
};
use crate::declarator::{Declaration, Descriptor, Slot};
use crate::error::{ResolveError, Result};
use crate::hooks::{HookEvent, Source};
use crate::registry::{Payload, Provider, Registration, Registry};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Values supplied for one resolution call, keyed by token. They take
/// precedence over every other source for the whole dependency graph.
pub type Overrides = HashMap<String, Value>;

/// Per-call resolution settings.
#[derive(Clone, Default)]
pub struct ResolveOptions {
  /// `None` defers to the level's `optional` config.
  pub optional: Option<bool>,
  pub with: Overrides,
}

impl ResolveOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn optional(mut self, optional: bool) -> Self {
    self.optional = Some(optional);
    self
  }

  pub fn with(mut self, token: impl Into<String>, v: Value) -> Self {
    self.with.insert(token.into(), v);
    self
  }
}

impl Registry {
  /// Resolves a token to its value.
  ///
  /// `Ok(None)` is only returned for optional resolutions: an explicit
  /// `optional` option, the level's `optional` config, or a token wrapped in
  /// underscores (`_name_`).
  pub fn resolve(&self, token: &str, options: ResolveOptions) -> Result<Option<Value>> {
    let optional = options
      .optional
      .unwrap_or_else(|| self.setting(|c| c.optional).unwrap_or(false));
    Resolution::new(self, &options.with).resolve(token, optional, None)
  }

  /// Resolves a required token and downcasts it.
  pub fn resolve_as<T: Any + Send + Sync>(&self, token: &str) -> Result<Arc<T>> {
    let (name, _) = parse_token(token);
    match self.resolve(token, ResolveOptions::new().optional(false))? {
      Some(v) => downcast(name, v),
      None => Err(ResolveError::NotFound {
        token: name.to_string(),
        path: Vec::new(),
      }),
    }
  }

  /// Resolves a token with per-call overrides.
  pub fn resolve_with(&self, token: &str, overrides: Overrides) -> Result<Option<Value>> {
    self.resolve(
      token,
      ResolveOptions {
        optional: None,
        with: overrides,
      },
    )
  }

  /// Resolves each dependency of a declaration independently. The result is
  /// both a positional list and, through [`Args::named`], a keyed map.
  pub fn resolve_dependencies(&self, deps: impl Into<Declaration>, overrides: Overrides) -> Result<Args> {
    let descriptor = Descriptor::from_declaration(&deps.into());
    let optional = self.setting(|c| c.optional).unwrap_or(false);
    let resolution = Resolution::new(self, &overrides);
    let values = descriptor
      .slots
      .iter()
      .map(|slot| resolution.resolve(&slot.token, optional, slot.options.as_ref()))
      .collect::<Result<Vec<_>>>()?;
    Ok(Args::assemble(&descriptor, values))
  }
}

/// State of one top-level resolution call.
struct Resolution<'a> {
  origin: &'a Registry,
  overrides: &'a Overrides,
  stack: ResolutionStack,
}

impl<'a> Resolution<'a> {
  fn new(origin: &'a Registry, overrides: &'a Overrides) -> Self {
    Self {
      origin,
      overrides,
      stack: ResolutionStack::default(),
    }
  }

  /// Resolves one token. An optional resolution turns every failure of its
  /// subtree, except hook errors, into `None`.
  fn resolve(&self, token: &str, optional: bool, options: Option<&Value>) -> Result<Option<Value>> {
    let (name, marked) = parse_token(token);
    let optional = optional || marked;

    match self.resolve_required(name, optional, options) {
      Err(err) if optional && err.is_recoverable() => {
        warn!(token = name, error = %err, "optional dependency resolved to undefined");
        self.undefined(name)
      }
      result => result,
    }
  }

  fn resolve_required(&self, name: &str, optional: bool, options: Option<&Value>) -> Result<Option<Value>> {
    let path = self.stack.path();
    let _guard = ResolutionGuard::enter(&self.stack, name)?;

    if let Some(v) = self.overrides.get(name) {
      return self.resolved(name, Source::Override, false, v.clone());
    }

    if name == OPTIONS_TOKEN {
      return match options {
        Some(v) => self.resolved(name, Source::Options, false, v.clone()),
        None => self.undefined(name),
      };
    }

    if let Some(registration) = self.origin.find(name) {
      return self.from_registration(&registration, optional, options);
    }

    if self.origin.setting(|c| c.modules).unwrap_or(true) {
      if let Some(module) = self.origin.modules().try_load(name) {
        debug!(level = %self.origin.id(), token = name, "registering platform module");
        self.origin.register(name, Provider::constant(module.clone()))?;
        return self.resolved(name, Source::Module, false, module);
      }
    }

    if self.origin.setting(|c| c.globals).unwrap_or(true) {
      if let Some(global) = self.origin.globals().lookup(name) {
        return self.resolved(name, Source::Global, false, global);
      }
    }

    if optional {
      trace!(token = name, "optional dependency not found");
      return self.undefined(name);
    }
    Err(ResolveError::NotFound {
      token: name.to_string(),
      path,
    })
  }

  fn from_registration(
    &self,
    registration: &Arc<Registration>,
    optional: bool,
    options: Option<&Value>,
  ) -> Result<Option<Value>> {
    let name = registration.token.as_str();
    let source = match &registration.payload {
      Payload::Constant(v) => return self.resolved(name, Source::Constant, false, v.clone()),
      Payload::Factory(_) => Source::Factory,
      Payload::Service { .. } => Source::Service,
    };

    // Values built from per-call input never enter or leave the cache.
    let cacheable = registration.lifecycle == Lifecycle::Singleton
      && self.overrides.is_empty()
      && options.is_none();
    if !cacheable {
      let v = self.invoke(registration, optional, options)?;
      return self.resolved(name, source, false, v);
    }

    let slot = self.origin.cache_slot(registration);
    if let Some(v) = slot.get() {
      return self.resolved(name, source, true, v.clone());
    }
    self.check_acyclic(registration, &mut HashSet::new())?;
    let v = if optional {
      trace!(token = name, "optional resolution bypasses the cache");
      self.invoke(registration, true, None)?
    } else {
      slot.get_or_try_init(|| self.invoke(registration, false, None))?.clone()
    };
    self.resolved(name, source, false, v)
  }

  /// Walks the declared graph below `registration` without invoking anything.
  ///
  /// A cycle is reported before any cache cell starts initializing. Otherwise
  /// two threads entering the same cycle from opposite ends would each wait
  /// on the cell the other one holds. Optional (`_name_`) edges are not
  /// followed: everything below them resolves optionally and never waits on
  /// a cell.
  fn check_acyclic(&self, registration: &Registration, checked: &mut HashSet<String>) -> Result<()> {
    let mut deps: Vec<&str> = registration.descriptor().tokens().collect();
    if let Payload::Service {
      parent: Some(parent),
      ..
    } = &registration.payload
    {
      deps.push(parent.as_str());
    }

    for dep in deps {
      let (name, marked) = parse_token(dep);
      if marked || name == OPTIONS_TOKEN || self.overrides.contains_key(name) || checked.contains(name) {
        continue;
      }
      let next = match self.origin.find(name) {
        Some(next) if !matches!(next.payload, Payload::Constant(_)) => next,
        _ => continue,
      };
      let _guard = ResolutionGuard::enter(&self.stack, name)?;
      self.check_acyclic(&next, checked)?;
      checked.insert(name.to_string());
    }
    Ok(())
  }

  /// Resolves a registration's dependencies and runs its callable.
  ///
  /// `options` are the group options this registration was requested with;
  /// they answer its own `$options` dependency.
  fn invoke(&self, registration: &Registration, optional: bool, options: Option<&Value>) -> Result<Value> {
    let descriptor = registration.descriptor();
    let values = descriptor
      .slots
      .iter()
      .map(|slot| self.resolve_slot(slot, optional, options))
      .collect::<Result<Vec<_>>>()?;
    let args = Args::assemble(descriptor, values);

    trace!(token = %registration.token, deps = descriptor.slots.len(), "invoking");
    match &registration.payload {
      Payload::Constant(v) => Ok(v.clone()),
      Payload::Factory(f) => f(&args),
      Payload::Service { ctor, parent } => {
        let parent = match parent {
          Some(parent) => Some(self.invoke_parent(parent, &args, optional)?),
          None => None,
        };
        ctor(&args.with_parent(parent))
      }
    }
  }

  /// Runs a service's parent callable with the child's named parameters.
  ///
  /// Parent dependencies missing from the child's parameters are resolved
  /// through the normal chain. The parent's own parent is not invoked.
  fn invoke_parent(&self, parent: &str, child: &Args, optional: bool) -> Result<Value> {
    let registration = self.origin.find(parent).ok_or_else(|| ResolveError::NotFound {
      token: parent.to_string(),
      path: self.stack.path(),
    })?;
    let _guard = ResolutionGuard::enter(&self.stack, parent)?;

    let named = child.named();
    let descriptor = registration.descriptor();
    let values = descriptor
      .slots
      .iter()
      .map(|slot| match named.value(&slot.token) {
        Some(v) => Ok(Some(v.clone())),
        None => self.resolve_slot(slot, optional, None),
      })
      .collect::<Result<Vec<_>>>()?;

    let callable = registration.callable();
    callable(&Args::assemble(descriptor, values))
  }

  fn resolve_slot(&self, slot: &Slot, optional: bool, options: Option<&Value>) -> Result<Option<Value>> {
    if parse_token(&slot.token).0 == OPTIONS_TOKEN {
      self.resolve(&slot.token, optional, options)
    } else {
      self.resolve(&slot.token, optional, slot.options.as_ref())
    }
  }

  fn undefined(&self, name: &str) -> Result<Option<Value>> {
    trace!(level = %self.origin.id(), token = name, "resolved to undefined");
    self.origin.trigger(HookEvent::Resolve {
      token: name.to_string(),
      source: Source::Undefined,
      cached: false,
    })?;
    Ok(None)
  }

  fn resolved(&self, name: &str, source: Source, cached: bool, v: Value) -> Result<Option<Value>> {
    trace!(level = %self.origin.id(), token = name, ?source, cached, "resolved");
    self.origin.trigger(HookEvent::Resolve {
      token: name.to_string(),
      source,
      cached,
    })?;
    Ok(Some(v))
  }
}
