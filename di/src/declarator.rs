//! Normalizes the supported dependency-declaration shapes into one ordered list.
//!
//! A registration may declare its dependencies as:
//!
//! - an explicit list of tokens, where any entry may be a named group
//!   (see [`Dependency::group`]) contributing one positional slot per key;
//! - the textual signature of its callable, whose parameter names become tokens;
//! - nothing at all.

use crate::core::Value;

/// One entry of an explicit dependency list.
#[derive(Clone)]
pub enum Dependency {
  /// A plain token occupying one positional slot.
  Token(String),
  /// A named group. Each key occupies its own positional slot, in order, and
  /// the keys are merged back into one named map for the callable. A key may
  /// carry options, exposed to that dependency as `$options`.
  Group(Vec<(String, Option<Value>)>),
}

impl Dependency {
  /// A group of plain keys.
  pub fn group<I, S>(keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Dependency::Group(keys.into_iter().map(|k| (k.into(), None)).collect())
  }

  /// A single-key group handing `options` to the dependency.
  pub fn with_options(token: impl Into<String>, options: Value) -> Self {
    Dependency::Group(vec![(token.into(), Some(options))])
  }
}

impl From<&str> for Dependency {
  fn from(token: &str) -> Self {
    Dependency::Token(token.to_string())
  }
}

impl From<String> for Dependency {
  fn from(token: String) -> Self {
    Dependency::Token(token)
  }
}

/// The raw dependency declaration attached to a registration.
#[derive(Clone, Default)]
pub enum Declaration {
  #[default]
  None,
  Explicit(Vec<Dependency>),
  /// Source text of a callable's signature, parsed at first resolution.
  Signature(String),
}

impl Declaration {
  pub fn signature(text: impl Into<String>) -> Self {
    Declaration::Signature(text.into())
  }
}

impl From<()> for Declaration {
  fn from(_: ()) -> Self {
    Declaration::None
  }
}

impl From<Vec<Dependency>> for Declaration {
  fn from(deps: Vec<Dependency>) -> Self {
    Declaration::Explicit(deps)
  }
}

impl<const N: usize> From<[&str; N]> for Declaration {
  fn from(tokens: [&str; N]) -> Self {
    Declaration::Explicit(tokens.into_iter().map(Dependency::from).collect())
  }
}

impl From<&[&str]> for Declaration {
  fn from(tokens: &[&str]) -> Self {
    Declaration::Explicit(tokens.iter().copied().map(Dependency::from).collect())
  }
}

impl From<Vec<&str>> for Declaration {
  fn from(tokens: Vec<&str>) -> Self {
    Declaration::Explicit(tokens.into_iter().map(Dependency::from).collect())
  }
}

impl<const N: usize> From<[Dependency; N]> for Declaration {
  fn from(deps: [Dependency; N]) -> Self {
    Declaration::Explicit(deps.into())
  }
}

/// One positional slot of a materialized descriptor.
#[derive(Clone)]
pub(crate) struct Slot {
  pub(crate) token: String,
  /// Index of the named group this slot belongs to, if any.
  pub(crate) group: Option<usize>,
  pub(crate) options: Option<Value>,
}

/// The ordered, flattened dependency list of a registration.
#[derive(Clone, Default)]
pub(crate) struct Descriptor {
  pub(crate) slots: Vec<Slot>,
  pub(crate) groups: usize,
}

impl Descriptor {
  pub(crate) fn from_declaration(declaration: &Declaration) -> Self {
    match declaration {
      Declaration::None => Descriptor::default(),
      Declaration::Explicit(deps) => Self::from_explicit(deps),
      Declaration::Signature(text) => Descriptor {
        slots: parse_parameters(text)
          .into_iter()
          .map(|token| Slot {
            token,
            group: None,
            options: None,
          })
          .collect(),
        groups: 0,
      },
    }
  }

  fn from_explicit(deps: &[Dependency]) -> Self {
    let mut descriptor = Descriptor::default();
    for dep in deps {
      match dep {
        Dependency::Token(token) => descriptor.slots.push(Slot {
          token: token.clone(),
          group: None,
          options: None,
        }),
        Dependency::Group(keys) => {
          let group = descriptor.groups;
          descriptor.groups += 1;
          for (token, options) in keys {
            descriptor.slots.push(Slot {
              token: token.clone(),
              group: Some(group),
              options: options.clone(),
            });
          }
        }
      }
    }
    descriptor
  }

  pub(crate) fn tokens(&self) -> impl Iterator<Item = &str> {
    self.slots.iter().map(|s| s.token.as_str())
  }
}

// --- Signature inference ---

/// Extracts declared parameter names from the source text of a callable.
///
/// Understands `function f(a, b) {`, `(a, b) =>`, `a =>`, `|a: T, b|` and
/// `fn f(a: T)`. Defaults and type annotations are stripped, destructured
/// parameters are dropped. Anything else yields no parameters, so minified or
/// otherwise unusual text silently loses its dependencies.
pub fn parse_parameters(signature: &str) -> Vec<String> {
  let text = strip_comments(signature);
  let text = text.trim();

  let list = if let Some(rest) = text.strip_prefix('|') {
    rest.find('|').map(|end| &rest[..end])
  } else if let Some(arrow) = text.find("=>").filter(|&at| !text[..at].contains('(')) {
    // `a => a + 1`
    Some(&text[..arrow])
  } else if let Some(open) = text.find('(') {
    let head = &text[..open];
    let is_arrow_or_fn = head.trim().is_empty()
      || head.trim_start().starts_with("function")
      || head.trim_start().starts_with("fn ")
      || head.trim_start().starts_with("async");
    if is_arrow_or_fn {
      matching_close(&text[open..]).map(|end| &text[open + 1..open + end])
    } else {
      None
    }
  } else {
    None
  };

  list.map(split_parameters).unwrap_or_default()
}

fn strip_comments(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;
  while !rest.is_empty() {
    if let Some(after) = rest.strip_prefix("/*") {
      rest = after.find("*/").map_or("", |end| &after[end + 2..]);
    } else if let Some(after) = rest.strip_prefix("//") {
      rest = after.find('\n').map_or("", |end| &after[end..]);
    } else {
      let mut chars = rest.chars();
      if let Some(c) = chars.next() {
        out.push(c);
      }
      rest = chars.as_str();
    }
  }
  out
}

/// Position of the bracket closing the one at the start of `text`.
fn matching_close(text: &str) -> Option<usize> {
  let mut depth = 0usize;
  for (i, c) in text.char_indices() {
    match c {
      '(' | '[' | '{' | '<' => depth += 1,
      ')' | ']' | '}' | '>' => {
        depth = depth.checked_sub(1)?;
        if depth == 0 {
          return Some(i);
        }
      }
      _ => {}
    }
  }
  None
}

/// Splits a parameter list on top-level commas.
fn split_parameters(list: &str) -> Vec<String> {
  let mut params = Vec::new();
  let mut depth = 0usize;
  let mut start = 0;
  for (i, c) in list.char_indices() {
    match c {
      '(' | '[' | '{' | '<' => depth += 1,
      ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
      ',' if depth == 0 => {
        params.extend(parameter_name(&list[start..i]));
        start = i + 1;
      }
      _ => {}
    }
  }
  params.extend(parameter_name(&list[start..]));
  params
}

fn parameter_name(raw: &str) -> Option<String> {
  let raw = raw.split('=').next().unwrap_or_default();
  let raw = raw.split(':').next().unwrap_or_default().trim();
  let raw = raw
    .strip_prefix("mut ")
    .or_else(|| raw.strip_prefix("ref "))
    .unwrap_or(raw)
    .trim();
  let raw = raw.strip_prefix("...").unwrap_or(raw);

  let is_identifier = raw
    .chars()
    .next()
    .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
    && raw.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');

  is_identifier.then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn infers_from_function_forms() {
    assert_eq!(parse_parameters("function (a, b) { return a; }"), vec!["a", "b"]);
    assert_eq!(parse_parameters("function named(\n  b\n) {"), vec!["b"]);
    assert_eq!(parse_parameters("(a, c) => a + c"), vec!["a", "c"]);
    assert_eq!(parse_parameters("b => b + 1"), vec!["b"]);
    assert_eq!(parse_parameters("() => 'FACTORY'"), Vec::<String>::new());
  }

  #[test]
  fn infers_from_rust_closures() {
    assert_eq!(parse_parameters("| a : i32, c : String |"), vec!["a", "c"]);
    assert_eq!(
      parse_parameters("fn build(mut db: Arc<Db>, cfg: HashMap<String, u8>)"),
      vec!["db", "cfg"]
    );
    assert_eq!(parse_parameters("||"), Vec::<String>::new());
  }

  #[test]
  fn strips_defaults_destructuring_and_comments() {
    assert_eq!(
      parse_parameters("function (a /* first */, b = 1, { c, d }, $options) {"),
      vec!["a", "b", "$options"]
    );
    assert_eq!(parse_parameters("(x = [1, 2], ...rest) => x"), vec!["x", "rest"]);
  }

  #[test]
  fn unknown_text_yields_no_parameters() {
    assert!(parse_parameters("n.a(b)").is_empty());
    assert!(parse_parameters("").is_empty());
  }

  #[test]
  fn groups_consume_one_slot_per_key() {
    let declaration = Declaration::from(vec![
      Dependency::from("x"),
      Dependency::group(["a", "b"]),
      Dependency::from("y"),
    ]);
    let descriptor = Descriptor::from_declaration(&declaration);

    assert_eq!(descriptor.tokens().collect::<Vec<_>>(), vec!["x", "a", "b", "y"]);
    let groups: Vec<_> = descriptor.slots.iter().map(|s| s.group).collect();
    assert_eq!(groups, vec![None, Some(0), Some(0), None]);
    assert_eq!(descriptor.groups, 1);
  }
}
