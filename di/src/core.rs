//! Core data structures shared by the registry and the resolver.

use crate::error::{ResolveError, Result};
use serde::Deserialize;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A resolved dependency. `None` in an `Option<Value>` stands for "undefined".
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wraps a concrete value so it can be stored in a registry.
pub fn value<T: Any + Send + Sync>(v: T) -> Value {
  Arc::new(v)
}

/// Downcasts a resolved value, reporting the token on mismatch.
pub fn downcast<T: Any + Send + Sync>(token: &str, v: Value) -> Result<Arc<T>> {
  v.downcast::<T>().map_err(|_| ResolveError::TypeMismatch {
    token: token.to_string(),
    expected: type_name::<T>(),
  })
}

/// The token under which a dependency's group options are exposed.
pub const OPTIONS_TOKEN: &str = "$options";

/// Splits the optional marker off a token.
///
/// `_name_` requests `name` optionally. A bare `_` or `__` is an ordinary token.
pub(crate) fn parse_token(token: &str) -> (&str, bool) {
  if token.len() > 2 && token.starts_with('_') && token.ends_with('_') {
    (&token[1..token.len() - 1], true)
  } else {
    (token, false)
  }
}

/// How long a resolved value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
  /// Resolved once and cached on its registration until the cache is cleared.
  #[default]
  Singleton,
  /// Rebuilt on every resolution.
  Transient,
}

/// Identifies one level of a registry chain in hook payloads and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(u64);

impl LevelId {
  pub(crate) fn next() -> Self {
    static NEXT_LEVEL: AtomicU64 = AtomicU64::new(0);
    LevelId(NEXT_LEVEL.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Display for LevelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "level#{}", self.0)
  }
}

/// The stack of tokens currently being resolved within one top-level call.
#[derive(Default)]
pub(crate) struct ResolutionStack {
  tokens: RefCell<Vec<String>>,
}

impl ResolutionStack {
  pub(crate) fn path(&self) -> Vec<String> {
    self.tokens.borrow().clone()
  }
}

/// An RAII guard marking a token as in flight.
///
/// Entering a token that is already on the stack is a circular dependency.
/// Dropping the guard pops the token, whether resolution succeeded or failed.
pub(crate) struct ResolutionGuard<'a> {
  stack: &'a ResolutionStack,
}

impl<'a> ResolutionGuard<'a> {
  pub(crate) fn enter(stack: &'a ResolutionStack, token: &str) -> Result<Self> {
    let mut tokens = stack.tokens.borrow_mut();
    if let Some(start) = tokens.iter().position(|t| t == token) {
      let mut cycle = tokens[start..].to_vec();
      cycle.push(token.to_string());
      return Err(ResolveError::CircularDependency { cycle });
    }
    tokens.push(token.to_string());
    Ok(Self { stack })
  }
}

impl Drop for ResolutionGuard<'_> {
  fn drop(&mut self) {
    self.stack.tokens.borrow_mut().pop();
  }
}
