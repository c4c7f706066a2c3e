//! Type-ahead search for list-like controls.
//!
//! Typing while a list has focus jumps to the first item whose text starts
//! with what was typed. [`PrefixSearch`] holds that state for one host
//! collection; the collection itself is reached through [`SearchHost`].

pub mod compare;
pub mod config;
pub mod engine;
pub mod item;
pub mod timeout;

pub use compare::{
  ComparerKind,
  FoldingComparer,
  OrdinalComparer,
  TextComparer,
};
pub use config::{
  ConfigError,
  SearchConfig,
};
pub use engine::{
  Keystroke,
  MatchedText,
  PrefixSearch,
};
pub use item::{
  ListHost,
  SearchHost,
  SearchItem,
};
pub use timeout::{
  Clock,
  ManualClock,
  SystemClock,
};
