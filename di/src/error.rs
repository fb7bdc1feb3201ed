use thiserror::Error;

/// Errors raised while resolving a token.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
  #[error("Dependency not found: '{token}' (resolution path: {})", display_path(.path))]
  NotFound { token: String, path: Vec<String> },

  #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
  CircularDependency { cycle: Vec<String> },

  #[error("Resolved value for '{token}' is not a {expected}")]
  TypeMismatch {
    token: String,
    expected: &'static str,
  },

  #[error("No argument supplied at position {index}")]
  MissingArgument { index: usize },

  #[error("Factory for '{token}' failed: {message}")]
  Factory { token: String, message: String },

  #[error(transparent)]
  Hook(#[from] HookError),
}

impl ResolveError {
  /// Builds a factory failure from any displayable error.
  pub fn factory(token: impl Into<String>, err: impl std::fmt::Display) -> Self {
    ResolveError::Factory {
      token: token.into(),
      message: err.to_string(),
    }
  }

  /// Whether an optional resolution may turn this error into `None`.
  pub(crate) fn is_recoverable(&self) -> bool {
    !matches!(self, ResolveError::Hook(_))
  }
}

fn display_path(path: &[String]) -> String {
  if path.is_empty() {
    "<root>".to_string()
  } else {
    path.join(" -> ")
  }
}

/// An error returned by a hook callback. It is never swallowed by the resolver.
#[derive(Debug, Clone, Error)]
#[error("Hook '{event}' failed: {message}")]
pub struct HookError {
  pub event: String,
  pub message: String,
}

impl HookError {
  pub fn new(event: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      event: event.into(),
      message: message.into(),
    }
  }
}

/// Raised synchronously by `Registry::use_plugin` when a plugin cannot be installed.
#[derive(Debug, Clone, Error)]
#[error("Plugin '{plugin}' could not be installed: {reason}")]
pub struct PluginInstallError {
  pub plugin: String,
  pub reason: String,
}

/// Raised when a registry configuration document cannot be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read configuration file: {0}")]
  Read(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  Parse(#[from] serde_yaml::Error),
}

/// A specialized `Result` type for resolution.
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
