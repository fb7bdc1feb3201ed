use fibre_di::{
  Args, Config, HookError, HookEvent, HostApi, Kind, Lifecycle, Plugin, Registry, ResolveError,
  ResolveOptions, Source,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

// --- Test Fixtures ---

/// Records the name of every event it sees.
struct RecorderPlugin {
  events: Arc<Mutex<Vec<String>>>,
}

impl Plugin for RecorderPlugin {
  fn name(&self) -> &str {
    "recorder"
  }

  fn install(&self, host: &HostApi) -> Result<(), String> {
    for event in ["extend", "register", "resolve", "clear_cache"] {
      let events = self.events.clone();
      host.on(event, move |payload| {
        events.lock().push(payload.event_name.clone());
        Ok(())
      });
    }
    Ok(())
  }
}

struct BrokenPlugin;

impl Plugin for BrokenPlugin {
  fn name(&self) -> &str {
    "broken"
  }

  fn install(&self, _host: &HostApi) -> Result<(), String> {
    Err("missing install capability".to_string())
  }
}

// --- Hook Tests ---

#[test]
fn test_resolve_fires_per_token_with_source() {
  // Arrange
  let registry = Registry::new();
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  registry.on("resolve", move |payload| {
    if let HookEvent::Resolve { token, source, cached } = &payload.event {
      sink.lock().push((token.clone(), *source, *cached));
    }
    Ok(())
  });
  registry.constant("a", 1_i32).unwrap();
  registry
    .factory("b", ["a"], |args: &Args| Ok(*args.get::<i32>(0)? + 1))
    .unwrap();

  // Act
  registry.resolve_as::<i32>("b").unwrap();
  registry.resolve_as::<i32>("b").unwrap();

  // Assert
  assert_eq!(
    *seen.lock(),
    vec![
      ("a".to_string(), Source::Constant, false),
      ("b".to_string(), Source::Factory, false),
      ("b".to_string(), Source::Factory, true),
    ]
  );
}

#[test]
fn test_undefined_resolution_fires_resolve() {
  // Arrange
  let registry = Registry::new();
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  registry.on("resolve", move |payload| {
    if let HookEvent::Resolve { token, source, cached } = &payload.event {
      sink.lock().push((token.clone(), *source, *cached));
    }
    Ok(())
  });
  registry
    .factory("needs_ghost", ["ghost"], |args: &Args| Ok(args.value(0).is_none()))
    .unwrap();

  // Act
  let missing = registry.resolve("_absent_", ResolveOptions::new()).unwrap();
  let degraded = registry.resolve("_needs_ghost_", ResolveOptions::new()).unwrap();

  // Assert
  assert!(missing.is_none());
  assert!(degraded.is_some());
  assert_eq!(
    *seen.lock(),
    vec![
      ("absent".to_string(), Source::Undefined, false),
      ("ghost".to_string(), Source::Undefined, false),
      ("needs_ghost".to_string(), Source::Factory, false),
    ]
  );
}

#[test]
fn test_hooks_apply_across_the_whole_tree() {
  // Arrange
  let root = Registry::new();
  let child = root.extend(Config::default()).unwrap();
  let grandchild = child.extend(Config::default()).unwrap();
  let levels = Arc::new(Mutex::new(Vec::new()));
  let sink = levels.clone();

  // Act
  // Installed on the child, observed from the root and the grandchild.
  child.on("register", move |payload| {
    sink.lock().push(payload.level);
    Ok(())
  });
  grandchild.constant("deep", 1_u8).unwrap();
  root.constant("shallow", 2_u8).unwrap();

  // Assert
  assert_eq!(*levels.lock(), vec![grandchild.id(), root.id()]);
}

#[test]
fn test_hooks_run_in_registration_order() {
  // Arrange
  let registry = Registry::new();
  let order = Arc::new(Mutex::new(Vec::new()));
  for i in 0..3 {
    let order = order.clone();
    registry.on("custom", move |_| {
      order.lock().push(i);
      Ok(())
    });
  }

  // Act
  registry
    .trigger(HookEvent::Custom {
      name: "custom".to_string(),
      data: json!({ "reason": "test" }),
    })
    .unwrap();

  // Assert
  assert_eq!(*order.lock(), vec![0, 1, 2]);
}

#[test]
fn test_hook_errors_propagate_even_for_optional_resolution() {
  // Arrange
  let registry = Registry::new();
  registry.constant("watched", 1_i32).unwrap();
  registry.on("resolve", |payload| {
    Err(HookError::new(payload.event_name.clone(), "rejected"))
  });

  // Act
  let err = registry
    .resolve("_watched_", ResolveOptions::new())
    .unwrap_err();

  // Assert
  assert!(matches!(err, ResolveError::Hook(ref hook) if hook.message == "rejected"));
}

#[test]
fn test_register_and_clear_cache_payloads() {
  // Arrange
  let registry = Registry::new();
  let events = Arc::new(Mutex::new(Vec::new()));
  for name in ["register", "clear_cache"] {
    let events = events.clone();
    registry.on(name, move |payload| {
      events.lock().push(payload.event.clone());
      Ok(())
    });
  }

  // Act
  registry.constant("x", 1_u8).unwrap();
  registry.clear_cache(&["x"]).unwrap();

  // Assert
  assert_eq!(
    *events.lock(),
    vec![
      HookEvent::Register {
        token: "x".to_string(),
        kind: Kind::Constant,
        lifecycle: Lifecycle::Singleton,
      },
      HookEvent::ClearCache {
        tokens: vec!["x".to_string()],
      },
    ]
  );
}

// --- Plugin Tests ---

#[test]
fn test_plugin_observes_lifecycle_events() {
  // Arrange
  let registry = Registry::new();
  let events = Arc::new(Mutex::new(Vec::new()));
  registry
    .use_plugin(&RecorderPlugin {
      events: events.clone(),
    })
    .unwrap();

  // Act
  let child = registry.extend(Config::default()).unwrap();
  child.constant("value", 3_u8).unwrap();
  child.resolve_as::<u8>("value").unwrap();
  child.clear_cache(&[]).unwrap();

  // Assert
  assert_eq!(
    *events.lock(),
    vec!["extend", "register", "resolve", "clear_cache"]
  );
}

#[test]
fn test_plugin_install_failure_is_reported() {
  // Arrange
  let registry = Registry::new();

  // Act
  let err = registry.use_plugin(&BrokenPlugin).unwrap_err();

  // Assert
  assert_eq!(err.plugin, "broken");
  assert!(err.to_string().contains("missing install capability"));
}
