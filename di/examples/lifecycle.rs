use fibre_di::{Args, Lifecycle, Provider, Registry};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let registry = Registry::new();

  // --- Singleton Registration ---
  // This factory will only be called ONCE until its cache is cleared.
  registry.factory("singleton_tracker", (), |_: &Args| {
    println!("Creating SINGLETON RequestTracker...");
    Ok(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  })?;

  // --- Transient Registration ---
  // This factory will be called EVERY time the token is resolved.
  registry.register(
    "transient_tracker",
    Provider::factory((), |_: &Args| {
      println!("Creating TRANSIENT RequestTracker...");
      Ok(RequestTracker {
        id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
      })
    })
    .lifecycle(Lifecycle::Transient),
  )?;

  println!("--- Resolving Singletons ---");
  let s1 = registry.resolve_as::<RequestTracker>("singleton_tracker")?;
  let s2 = registry.resolve_as::<RequestTracker>("singleton_tracker")?;
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2));

  println!("\n--- Resolving Transients ---");
  let t1 = registry.resolve_as::<RequestTracker>("transient_tracker")?;
  let t2 = registry.resolve_as::<RequestTracker>("transient_tracker")?;
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_ne!(t1.id, t2.id);

  println!("\n--- Clearing the singleton cache ---");
  registry.clear_cache(&["singleton_tracker"])?;
  let s3 = registry.resolve_as::<RequestTracker>("singleton_tracker")?;
  println!("Singleton after clear ID: {}", s3.id);
  assert_ne!(s1.id, s3.id);

  Ok(())
}
