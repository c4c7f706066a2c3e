//! A mutable symbol buffer that keeps live positions in step with its edits.
//!
//! Every edit runs inside a change bracket. Brackets nest; only the outermost
//! [`TextStore::end_change`] notifies `changing` and `changed` listeners, and
//! only if something was edited since the bracket opened. `change` listeners
//! run after each individual edit while the store refuses further content
//! edits.
//!
//! Offsets count symbols (Unicode scalar values), never bytes.

use std::{
  fmt,
  iter,
  ops::Range,
};

use ropey::Rope;
use thiserror::Error;

use crate::{
  change::{
    ChangeEvent,
    ChangeRecord,
    ListenerId,
    Listeners,
  },
  config::StoreConfig,
  position::{
    Gravity,
    LivePosition,
    PositionList,
    StoreId,
  },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
  #[error("offset {offset} is out of bounds for {len} symbols")]
  OffsetOutOfBounds { offset: usize, len: usize },
  #[error("range {start}..{end} is inverted")]
  InvertedRange { start: usize, end: usize },
  #[error("position belongs to another store")]
  ForeignPosition,
  #[error("position is no longer tracked")]
  DetachedPosition,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Where the store is in a change bracket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
  #[default]
  Idle,
  /// Open, nothing edited yet.
  Accumulating { depth: usize },
  /// Open, with edits waiting for the outermost end.
  Pending { depth: usize },
  /// `change` listeners are running. Content is read-only.
  Dispatching { depth: usize },
}

impl Bracket {
  pub fn depth(self) -> usize {
    match self {
      Bracket::Idle => 0,
      Bracket::Accumulating { depth }
      | Bracket::Pending { depth }
      | Bracket::Dispatching { depth } => depth,
    }
  }

  pub fn is_read_only(self) -> bool {
    matches!(self, Bracket::Dispatching { .. })
  }
}

pub struct TextStore {
  id:         StoreId,
  config:     StoreConfig,
  text:       Rope,
  positions:  PositionList,
  bracket:    Bracket,
  pending:    ChangeEvent,
  listeners:  Listeners,
  generation: u64,
}

impl Default for TextStore {
  fn default() -> Self {
    Self::new(StoreConfig::default())
  }
}

impl fmt::Debug for TextStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // never print the content, it may be a secret
    f.debug_struct("TextStore")
      .field("symbols", &self.symbol_count())
      .field("positions", &self.positions.len())
      .field("bracket", &self.bracket)
      .field("generation", &self.generation)
      .finish_non_exhaustive()
  }
}

impl TextStore {
  pub fn new(config: StoreConfig) -> Self {
    let id = StoreId::next();
    Self {
      id,
      config,
      text: Rope::new(),
      positions: PositionList::new(id),
      bracket: Bracket::Idle,
      pending: ChangeEvent::default(),
      listeners: Listeners::default(),
      generation: 0,
    }
  }

  /// A store initialized with `text`, without notifying anyone.
  pub fn from_text(text: &str) -> Self {
    let mut store = Self::default();
    store.text = Rope::from_str(text);
    store
  }

  pub fn config(&self) -> &StoreConfig {
    &self.config
  }

  pub fn symbol_count(&self) -> usize {
    self.text.len_chars()
  }

  pub fn is_empty(&self) -> bool {
    self.symbol_count() == 0
  }

  /// The unmasked content.
  pub fn text(&self) -> String {
    self.text.to_string()
  }

  pub fn rope(&self) -> &Rope {
    &self.text
  }

  pub fn slice(&self, range: Range<usize>) -> Result<String> {
    self.check_range(&range)?;
    Ok(self.text.slice(range).to_string())
  }

  /// One mask char per symbol.
  pub fn masked_text(&self) -> String {
    iter::repeat_n(self.config.mask_char, self.symbol_count()).collect()
  }

  /// Bumped by every content edit.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn bracket(&self) -> Bracket {
    self.bracket
  }

  pub fn is_changing(&self) -> bool {
    self.bracket != Bracket::Idle
  }

  fn check_offset(&self, offset: usize) -> Result<()> {
    let len = self.symbol_count();
    if offset > len {
      return Err(StoreError::OffsetOutOfBounds { offset, len });
    }
    Ok(())
  }

  fn check_range(&self, range: &Range<usize>) -> Result<()> {
    if range.start > range.end {
      return Err(StoreError::InvertedRange {
        start: range.start,
        end:   range.end,
      });
    }
    self.check_offset(range.end)
  }

  fn assert_writable(&self) {
    assert!(
      !self.bracket.is_read_only(),
      "text store content modified from a change listener"
    );
  }

  /// Opens a change bracket.
  ///
  /// # Panics
  ///
  /// Panics when called from a `change` listener.
  pub fn begin_change(&mut self) {
    self.bracket = match self.bracket {
      Bracket::Idle => Bracket::Accumulating { depth: 1 },
      Bracket::Accumulating { depth } => Bracket::Accumulating { depth: depth + 1 },
      Bracket::Pending { depth } => Bracket::Pending { depth: depth + 1 },
      Bracket::Dispatching { .. } => {
        panic!("change bracket opened from a change listener")
      },
    };
  }

  /// Closes a change bracket. Closing the outermost one with edits pending
  /// notifies `changing` and then `changed` listeners.
  ///
  /// # Panics
  ///
  /// Panics without a matching [`begin_change`](Self::begin_change), or when
  /// called from a `change` listener.
  pub fn end_change(&mut self) {
    self.bracket = match self.bracket {
      Bracket::Idle => panic!("end_change called without a matching begin_change"),
      Bracket::Dispatching { .. } => panic!("change bracket closed from a change listener"),
      Bracket::Accumulating { depth: 1 } => Bracket::Idle,
      Bracket::Accumulating { depth } => Bracket::Accumulating { depth: depth - 1 },
      Bracket::Pending { depth: 1 } => {
        self.flush();
        return;
      },
      Bracket::Pending { depth } => Bracket::Pending { depth: depth - 1 },
    };
  }

  /// Runs `f` inside a change bracket.
  pub fn change<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
    self.begin_change();
    let result = f(self);
    self.end_change();
    result
  }

  fn flush(&mut self) {
    self.bracket = Bracket::Idle;
    let event = std::mem::take(&mut self.pending);
    tracing::debug!(
      records = event.len(),
      generation = self.generation,
      "flushing text changes"
    );

    let mut changing = std::mem::take(&mut self.listeners.changing);
    for (_, listener) in &mut changing {
      listener(&*self);
    }
    self.listeners.changing = changing;

    let mut changed = std::mem::take(&mut self.listeners.changed);
    for (_, listener) in &mut changed {
      listener(&*self, &event);
    }
    self.listeners.changed = changed;
  }

  /// Records an edit that already happened and runs `change` listeners.
  fn commit(&mut self, record: ChangeRecord) {
    let (Bracket::Accumulating { depth } | Bracket::Pending { depth }) = self.bracket else {
      unreachable!("edit outside of an open change bracket");
    };
    self.generation += 1;
    self.pending.push(record);

    self.bracket = Bracket::Dispatching { depth };
    let mut taken = self.listeners.take_change();
    for (_, listener) in &mut taken {
      listener(&mut *self, &record);
    }
    self.listeners.restore_change(taken);
    self.bracket = Bracket::Pending { depth };
  }

  fn insert_unchecked(&mut self, offset: usize, text: &str) {
    if text.is_empty() {
      return;
    }
    let len = text.chars().count();
    self.change(|store| {
      store.text.insert(offset, text);
      store.positions.rebase(offset, len as isize);
      store.commit(ChangeRecord::added(offset, len));
    });
  }

  fn delete_unchecked(&mut self, range: Range<usize>) {
    if range.is_empty() {
      return;
    }
    let len = range.len();
    self.change(|store| {
      store.text.remove(range.clone());
      store.positions.rebase(range.start, -(len as isize));
      store.commit(ChangeRecord::removed(range.start, len));
    });
  }

  /// Inserts `text` at the current offset of `at`.
  ///
  /// # Panics
  ///
  /// Panics when called from a `change` listener.
  pub fn insert_text(&mut self, at: &LivePosition, text: &str) -> Result<()> {
    let offset = self.offset_of(at)?;
    self.insert_text_at(offset, text)
  }

  pub fn insert_text_at(&mut self, offset: usize, text: &str) -> Result<()> {
    self.assert_writable();
    self.check_offset(offset)?;
    self.insert_unchecked(offset, text);
    Ok(())
  }

  /// Removes the symbols between two positions.
  ///
  /// # Panics
  ///
  /// Panics when called from a `change` listener.
  pub fn delete_content(&mut self, start: &LivePosition, end: &LivePosition) -> Result<()> {
    let start = self.offset_of(start)?;
    let end = self.offset_of(end)?;
    self.delete_range(start..end)
  }

  pub fn delete_range(&mut self, range: Range<usize>) -> Result<()> {
    self.assert_writable();
    self.check_range(&range)?;
    self.delete_unchecked(range);
    Ok(())
  }

  /// Replaces the whole content: one removal, then one insertion.
  pub fn set_buffer_content(&mut self, text: &str) {
    self.assert_writable();
    self.delete_unchecked(0..self.symbol_count());
    self.insert_unchecked(0, text);
  }

  pub fn clear(&mut self) {
    self.assert_writable();
    self.delete_unchecked(0..self.symbol_count());
  }

  /// Starts tracking `offset`.
  pub fn add_live_position(&mut self, offset: usize, gravity: Gravity) -> Result<LivePosition> {
    self.check_offset(offset)?;
    Ok(self.positions.insert(offset, gravity))
  }

  /// A position that stays at the start of the content.
  pub fn start_position(&mut self) -> LivePosition {
    self.positions.insert(0, Gravity::Backward)
  }

  /// A position that stays at the end of the content.
  pub fn end_position(&mut self) -> LivePosition {
    self.positions.insert(self.symbol_count(), Gravity::Forward)
  }

  /// Stops tracking `position`. Dropping the handle has the same effect
  /// the next time positions are edited.
  ///
  /// # Panics
  ///
  /// Panics if `position` is not tracked by this store.
  pub fn remove_live_position(&mut self, position: LivePosition) {
    assert!(
      position.store() == self.id,
      "position belongs to another store"
    );
    self.positions.remove(position.key());
  }

  fn lookup(&self, position: &LivePosition) -> Result<(usize, Gravity)> {
    if position.store() != self.id {
      return Err(StoreError::ForeignPosition);
    }
    self
      .positions
      .get(position.key())
      .ok_or(StoreError::DetachedPosition)
  }

  pub fn offset_of(&self, position: &LivePosition) -> Result<usize> {
    self.lookup(position).map(|(offset, _)| offset)
  }

  pub fn gravity_of(&self, position: &LivePosition) -> Result<Gravity> {
    self.lookup(position).map(|(_, gravity)| gravity)
  }

  pub fn set_gravity(&mut self, position: &LivePosition, gravity: Gravity) -> Result<()> {
    let (offset, _) = self.lookup(position)?;
    self.positions.reposition(position.key(), offset, gravity);
    Ok(())
  }

  pub fn move_position(&mut self, position: &LivePosition, offset: usize) -> Result<()> {
    self.check_offset(offset)?;
    let (_, gravity) = self.lookup(position)?;
    self.positions.reposition(position.key(), offset, gravity);
    Ok(())
  }

  pub fn live_position_count(&self) -> usize {
    self.positions.iter().count()
  }

  /// Live positions in sorted order.
  pub fn positions(&self) -> impl Iterator<Item = (usize, Gravity)> + '_ {
    self.positions.iter()
  }

  /// Runs `f` once per outermost bracket with edits, before `changed`.
  pub fn on_changing<F>(&mut self, f: F) -> ListenerId
  where
    F: FnMut(&TextStore) + 'static,
  {
    let id = self.listeners.next_id();
    self.listeners.changing.push((id, Box::new(f)));
    id
  }

  /// Runs `f` after every edit. The store rejects content edits while it
  /// runs; positions may still be added, moved or removed.
  pub fn on_change<F>(&mut self, f: F) -> ListenerId
  where
    F: FnMut(&mut TextStore, &ChangeRecord) + 'static,
  {
    let id = self.listeners.next_id();
    self.listeners.change.push((id, Box::new(f)));
    id
  }

  /// Runs `f` with all edits of an outermost bracket once it closes.
  pub fn on_changed<F>(&mut self, f: F) -> ListenerId
  where
    F: FnMut(&TextStore, &ChangeEvent) + 'static,
  {
    let id = self.listeners.next_id();
    self.listeners.changed.push((id, Box::new(f)));
    id
  }

  pub fn remove_listener(&mut self, id: ListenerId) -> bool {
    self.listeners.remove(id)
  }
}
