use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::compare::ComparerKind;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("invalid search config: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("search timeout must be positive")]
  ZeroTimeout,
}

/// Per-host type-ahead settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SearchConfig {
  /// Idle time after which the typed prefix is forgotten.
  pub timeout_ms:     u64,
  pub case_sensitive: bool,
  /// Dotted path into item data used as the primary text.
  pub text_path:      Option<String>,
  pub comparer:       ComparerKind,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      // twice the usual double-click interval
      timeout_ms:     1000,
      case_sensitive: false,
      text_path:      None,
      comparer:       ComparerKind::Folding,
    }
  }
}

impl SearchConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    if config.timeout_ms == 0 {
      return Err(ConfigError::ZeroTimeout);
    }
    Ok(config)
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}
