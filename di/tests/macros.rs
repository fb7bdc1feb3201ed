//! Tests for the registration macros that infer dependencies from closure
//! parameter names, and for signature-declared registrations.

use fibre_di::{downcast, factory, service, value, Args, Declaration, Overrides, Registry};

// --- Test Fixtures ---

struct Dependent {
  val: String,
}

struct Master {
  val: String,
  sub: String,
}

fn with(pairs: &[(&str, &'static str)]) -> Overrides {
  pairs
    .iter()
    .map(|(token, v)| (token.to_string(), value(v.to_string())))
    .collect()
}

// --- Macro Tests ---

#[test]
fn test_factory_macro_infers_dependencies() {
  // Arrange
  let registry = Registry::new();
  registry.constant("a", 1_i32).unwrap();
  factory!(registry, "b", |a: i32| *a + 1).unwrap();
  factory!(registry, "c", |b: i32| *b + 1).unwrap();

  // Act
  let c = registry.resolve_as::<i32>("c").unwrap();

  // Assert
  assert_eq!(*c, 3);
}

#[test]
fn test_factory_macro_without_parameters() {
  let registry = Registry::new();
  factory!(registry, "factory", || "FACTORY".to_string()).unwrap();
  assert_eq!(*registry.resolve_as::<String>("factory").unwrap(), "FACTORY");
}

#[test]
fn test_service_macro_exposes_named_parameters() {
  // Arrange
  let registry = Registry::new();
  service!(registry, "dependent", || Dependent {
    val: "DEPENDENT".to_string()
  })
  .unwrap();
  service!(registry, "master", args => |dependent: Dependent| Master {
    val: "MASTER".to_string(),
    sub: format!("{}/{}", dependent.val, args.named().len()),
  })
  .unwrap();

  // Act
  let master = registry.resolve_as::<Master>("master").unwrap();

  // Assert
  assert_eq!(master.val, "MASTER");
  assert_eq!(master.sub, "DEPENDENT/1");
}

#[test]
fn test_inferred_names_accept_overrides() {
  // Arrange
  let registry = Registry::new();
  factory!(registry, "foo", |named: String| (*named).clone()).unwrap();

  // Act
  let result = registry
    .resolve_with("foo", with(&[("named", "pop")]))
    .unwrap()
    .unwrap();

  // Assert
  assert_eq!(*downcast::<String>("foo", result).unwrap(), "pop");
}

#[test]
fn test_signature_text_declares_dependencies() {
  // Arrange
  let registry = Registry::new();
  registry
    .factory(
      "sig",
      Declaration::signature("function (b, c, d) { return b + c + d; }"),
      |args: &Args| {
        Ok(format!(
          "{}{}{}",
          args.get::<String>(0)?,
          args.get::<String>(1)?,
          args.get::<String>(2)?
        ))
      },
    )
    .unwrap();

  // Act
  let result = registry
    .resolve_with("sig", with(&[("b", "b"), ("c", "c"), ("d", "d")]))
    .unwrap()
    .unwrap();

  // Assert
  assert_eq!(*downcast::<String>("sig", result).unwrap(), "bcd");
}

#[test]
fn test_unparseable_signature_loses_its_dependencies() {
  // Arrange
  let registry = Registry::new();
  registry
    .factory("minified", Declaration::signature("n.a(b)"), |args: &Args| {
      Ok(args.len())
    })
    .unwrap();

  // Act
  let len = registry.resolve_as::<usize>("minified").unwrap();

  // Assert
  assert_eq!(*len, 0);
}
