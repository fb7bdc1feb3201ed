use fibre_di::{factory, Config, Registry, ResolveOptions};

// Resolves a greeting from whatever level it is handed.
// By accepting a `&Registry`, it can be run against a controlled child level.
fn greet(registry: &Registry) -> Result<String, fibre_di::ResolveError> {
  let greeting = registry.resolve_as::<String>("greeting")?;
  Ok(format!("Greeting: {}", greeting))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let app = Registry::new();
  app.constant("name", "World".to_string())?;
  factory!(app, "greeting", |name: String| format!("Hello, {}!", name))?;

  // --- A child level for tests ---
  // The child shadows `name` without touching the application level.
  let test_scope = app.extend(Config::default())?;
  test_scope.constant("name", "Test".to_string())?;
  factory!(test_scope, "greeting", |name: String| format!("Hello, {}!", name))?;

  println!("{}", greet(&app)?);
  println!("{}", greet(&test_scope)?);
  assert_eq!(greet(&app)?, "Greeting: Hello, World!");
  assert_eq!(greet(&test_scope)?, "Greeting: Hello, Test!");

  // --- An optional level ---
  // Missing tokens resolve to `None` instead of failing.
  let lenient = app.extend(Config::default().optional(true))?;
  let missing = lenient.resolve("not_registered", ResolveOptions::new())?;
  assert!(missing.is_none());
  println!("\nMissing token on the lenient level resolved to None.");

  Ok(())
}
