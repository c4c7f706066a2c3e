use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("invalid store config: {0}")]
  Toml(#[from] toml::de::Error),
  #[error("mask char {0:?} is a control character")]
  ControlMaskChar(char),
}

/// Settings for a [`TextStore`](crate::TextStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct StoreConfig {
  /// Shown in place of every symbol by `masked_text`.
  pub mask_char: char,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { mask_char: '●' }
  }
}

impl StoreConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    if config.mask_char.is_control() {
      return Err(ConfigError::ControlMaskChar(config.mask_char));
    }
    Ok(config)
  }
}
