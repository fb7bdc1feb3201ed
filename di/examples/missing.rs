use fibre_di::{Args, Registry, ResolveError, ResolveOptions};

fn main() {
  let registry = Registry::new();
  registry
    .factory("report", ["database"], |args: &Args| {
      Ok(format!("report from {}", args.get::<String>(0)?))
    })
    .expect("no hooks installed");

  // --- Required resolution ---
  println!("Attempting to resolve a token whose dependency was never registered...");
  match registry.resolve("report", ResolveOptions::new()) {
    Err(ResolveError::NotFound { token, path }) => {
      println!("Correctly failed: '{}' is missing (path: {:?})", token, path);
      assert_eq!(token, "database");
    }
    Err(other) => panic!("Unexpected error: {}", other),
    Ok(_) => panic!("Should not have resolved!"),
  }

  // --- Optional resolution ---
  println!("\nNow resolving the same token optionally with `_report_`...");
  let report = registry
    .resolve("_report_", ResolveOptions::new())
    .expect("optional resolution never fails");
  assert!(report.is_none());
  println!("Correctly received `None` for the optional token.");
}
