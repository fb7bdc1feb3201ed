//! The arguments handed to factories and services.

use crate::core::{downcast, Value};
use crate::declarator::Descriptor;
use crate::error::{ResolveError, Result};
use std::any::Any;
use std::sync::Arc;

/// A token-keyed view over resolved dependencies, in declaration order.
#[derive(Clone, Default)]
pub struct NamedArgs {
  entries: Vec<(String, Option<Value>)>,
}

impl NamedArgs {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `value` unless the token already holds a defined value.
  pub fn insert(&mut self, token: impl Into<String>, value: Option<Value>) {
    let token = token.into();
    match self.entries.iter_mut().find(|(t, _)| *t == token) {
      Some((_, slot)) => {
        if slot.is_none() {
          *slot = value;
        }
      }
      None => self.entries.push((token, value)),
    }
  }

  pub fn value(&self, token: &str) -> Option<&Value> {
    self
      .entries
      .iter()
      .find(|(t, _)| t == token)
      .and_then(|(_, v)| v.as_ref())
  }

  pub fn get<T: Any + Send + Sync>(&self, token: &str) -> Result<Arc<T>> {
    match self.value(token) {
      Some(v) => downcast(token, v.clone()),
      None => Err(ResolveError::NotFound {
        token: token.to_string(),
        path: Vec::new(),
      }),
    }
  }

  pub fn contains(&self, token: &str) -> bool {
    self.entries.iter().any(|(t, _)| t == token)
  }

  pub fn tokens(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(t, _)| t.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Resolved dependencies of one invocation.
///
/// Slots are positional, one per declared token. Tokens declared inside a
/// named group are also available through [`Args::group`], and every token
/// through [`Args::named`].
#[derive(Clone, Default)]
pub struct Args {
  tokens: Vec<String>,
  values: Vec<Option<Value>>,
  groups: Vec<NamedArgs>,
  parent: Option<Value>,
}

impl Args {
  /// Builds positional arguments by hand, e.g. to call a callable obtained from `raw`.
  pub fn from_values<I>(values: I) -> Self
  where
    I: IntoIterator<Item = Value>,
  {
    let values: Vec<Option<Value>> = values.into_iter().map(Some).collect();
    Self {
      tokens: (0..values.len()).map(|i| i.to_string()).collect(),
      values,
      groups: Vec::new(),
      parent: None,
    }
  }

  pub(crate) fn assemble(descriptor: &Descriptor, values: Vec<Option<Value>>) -> Self {
    let mut groups = vec![NamedArgs::new(); descriptor.groups];
    for (slot, v) in descriptor.slots.iter().zip(&values) {
      if let Some(group) = slot.group {
        groups[group].insert(slot.token.clone(), v.clone());
      }
    }
    Self {
      tokens: descriptor.tokens().map(str::to_string).collect(),
      values,
      groups,
      parent: None,
    }
  }

  pub(crate) fn with_parent(mut self, parent: Option<Value>) -> Self {
    self.parent = parent;
    self
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// The value at `index`, `None` if it resolved to undefined or is out of range.
  pub fn value(&self, index: usize) -> Option<&Value> {
    self.values.get(index).and_then(Option::as_ref)
  }

  /// The typed value at `index`; a missing value is an error.
  pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    let v = self
      .value(index)
      .cloned()
      .ok_or(ResolveError::MissingArgument { index })?;
    let token = self.tokens.get(index).map_or("", String::as_str);
    downcast(token, v)
  }

  /// The typed value at `index`, `None` when undefined or of another type.
  pub fn opt<T: Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
    self.value(index).cloned()?.downcast::<T>().ok()
  }

  /// The merged map of the `n`th named group.
  pub fn group(&self, n: usize) -> Option<&NamedArgs> {
    self.groups.get(n)
  }

  /// Every slot keyed by its token. The first defined value wins on duplicates.
  pub fn named(&self) -> NamedArgs {
    let mut named = NamedArgs::new();
    for (token, v) in self.tokens.iter().zip(&self.values) {
      named.insert(token.clone(), v.clone());
    }
    named
  }

  /// The instance produced by a chained parent service.
  pub fn parent(&self) -> Option<&Value> {
    self.parent.as_ref()
  }

  pub fn parent_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.parent.clone()?.downcast::<T>().ok()
  }

  /// A cursor taking slots in declaration order.
  pub fn cursor(&self) -> ArgCursor<'_> {
    ArgCursor {
      args: self,
      next: 0,
    }
  }
}

/// Walks the positional slots of [`Args`] in order. Used by the registration macros.
pub struct ArgCursor<'a> {
  args: &'a Args,
  next: usize,
}

impl ArgCursor<'_> {
  pub fn take<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
    let index = self.next;
    self.next += 1;
    self.args.get(index)
  }

  pub fn take_opt<T: Any + Send + Sync>(&mut self) -> Option<Arc<T>> {
    let index = self.next;
    self.next += 1;
    self.args.opt(index)
  }
}
