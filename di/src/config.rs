//! Per-level registry configuration.

use crate::core::Lifecycle;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Settings for one registry level.
///
/// Every field is optional. An unset field reads through to the parent level,
/// and the root falls back to the documented default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// Resolve every token optionally unless a call says otherwise. Default: `false`.
  #[serde(default)]
  pub optional: Option<bool>,
  /// Lifecycle given to registrations that do not pick one. Default: singleton.
  #[serde(default)]
  pub lifecycle: Option<Lifecycle>,
  /// Consult the platform module resolver for unregistered tokens. Default: `true`.
  #[serde(default)]
  pub modules: Option<bool>,
  /// Consult the global namespace for unregistered tokens. Default: `true`.
  #[serde(default)]
  pub globals: Option<bool>,
}

impl Config {
  pub fn optional(mut self, optional: bool) -> Self {
    self.optional = Some(optional);
    self
  }

  pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
    self.lifecycle = Some(lifecycle);
    self
  }

  pub fn modules(mut self, enabled: bool) -> Self {
    self.modules = Some(enabled);
    self
  }

  pub fn globals(mut self, enabled: bool) -> Self {
    self.globals = Some(enabled);
    self
  }

  pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
    Ok(serde_yaml::from_str(text)?)
  }

  pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_yaml(&text)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_partial_yaml() {
    let config = Config::from_yaml("optional: true\nlifecycle: transient\n").unwrap();
    assert_eq!(config.optional, Some(true));
    assert_eq!(config.lifecycle, Some(Lifecycle::Transient));
    assert_eq!(config.modules, None);
  }

  #[test]
  fn rejects_unknown_fields() {
    assert!(Config::from_yaml("precedence: active\n").is_err());
  }

  #[test]
  fn loads_from_file() {
    let path = std::env::temp_dir().join(format!("fibre_di_config_{}.yaml", std::process::id()));
    std::fs::write(&path, "modules: false\nglobals: true\n").unwrap();

    let config = Config::from_yaml_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config, Config::default().modules(false).globals(true));
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let path = std::env::temp_dir().join("fibre_di_config_does_not_exist.yaml");
    assert!(matches!(Config::from_yaml_file(path), Err(ConfigError::Read(_))));
  }
}
