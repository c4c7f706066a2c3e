//! Text storage with live positions.
//!
//! [`TextStore`] holds a symbol buffer (typically a password field's secret)
//! and a set of positions that follow edits to it. Positions are handed out
//! as [`LivePosition`] handles; the store keeps only weak references, so
//! dropping a handle is enough to stop tracking it.

pub mod change;
pub mod config;
pub mod position;
pub mod store;

pub use change::{
  ChangeEvent,
  ChangeKind,
  ChangeRecord,
  ListenerId,
};
pub use config::{
  ConfigError,
  StoreConfig,
};
pub use position::{
  Gravity,
  LivePosition,
  PositionKey,
};
pub use store::{
  Bracket,
  Result,
  StoreError,
  TextStore,
};
