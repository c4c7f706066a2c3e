//! Live positions into a text store.
//!
//! A position is an offset into the buffer together with a [`Gravity`] that
//! decides which side of an insertion at that offset it ends up on. The store
//! keeps every position in a [`PositionList`] sorted by `(offset, gravity)`
//! and rebases them in a single pass whenever content changes.
//!
//! The store does not own the positions it tracks. Each [`LivePosition`]
//! handle holds a liveness token, and the list only keeps a weak reference to
//! it. Dropping a handle leaves a dead slot behind that is pruned the next
//! time the list is edited.

use std::{
  fmt,
  rc::{
    Rc,
    Weak,
  },
  sync::atomic::{
    AtomicU64,
    Ordering,
  },
};

use serde::{
  Deserialize,
  Serialize,
};
use slotmap::SlotMap;

/// Which side of an insertion at its own offset a position sticks to.
///
/// At equal offsets `Backward` sorts before `Forward`.
#[derive(
  Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Gravity {
  /// Stays before text inserted at its offset.
  #[default]
  Backward,
  /// Moves past text inserted at its offset.
  Forward,
}

impl Gravity {
  #[must_use]
  pub fn invert(self) -> Self {
    match self {
      Gravity::Backward => Gravity::Forward,
      Gravity::Forward => Gravity::Backward,
    }
  }
}

slotmap::new_key_type! {
    pub struct PositionKey;
}

/// Identifies the store a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StoreId(u64);

impl StoreId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    StoreId(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

/// Handle to a position tracked by a [`TextStore`](crate::TextStore).
///
/// The offset is read back through the store, which keeps it up to date as
/// content changes. Dropping the handle stops tracking.
pub struct LivePosition {
  store: StoreId,
  key:   PositionKey,
  token: Rc<()>,
}

impl LivePosition {
  pub(crate) fn store(&self) -> StoreId {
    self.store
  }

  pub fn key(&self) -> PositionKey {
    self.key
  }
}

impl fmt::Debug for LivePosition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LivePosition")
      .field("store", &self.store.0)
      .field("key", &self.key)
      .finish()
  }
}

#[derive(Debug)]
struct Slot {
  offset:  usize,
  gravity: Gravity,
  token:   Weak<()>,
}

impl Slot {
  #[inline]
  fn sort_key(&self) -> (usize, Gravity) {
    (self.offset, self.gravity)
  }

  #[inline]
  fn is_live(&self) -> bool {
    self.token.strong_count() > 0
  }
}

/// Positions of one store, sorted by `(offset, gravity)`.
#[derive(Debug)]
pub(crate) struct PositionList {
  store: StoreId,
  slots: SlotMap<PositionKey, Slot>,
  order: Vec<PositionKey>,
}

impl PositionList {
  pub(crate) fn new(store: StoreId) -> Self {
    Self {
      store,
      slots: SlotMap::with_key(),
      order: Vec::new(),
    }
  }

  /// Number of tracked slots, including dead ones not yet pruned.
  pub(crate) fn len(&self) -> usize {
    self.order.len()
  }

  pub(crate) fn get(&self, key: PositionKey) -> Option<(usize, Gravity)> {
    self.slots.get(key).map(Slot::sort_key)
  }

  /// Live positions in list order.
  pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, Gravity)> + '_ {
    self
      .order
      .iter()
      .map(|key| &self.slots[*key])
      .filter(|slot| slot.is_live())
      .map(Slot::sort_key)
  }

  /// Drops slots whose handle is gone. Returns how many were removed.
  pub(crate) fn prune(&mut self) -> usize {
    let before = self.order.len();
    let slots = &mut self.slots;
    self.order.retain(|key| {
      if slots[*key].is_live() {
        true
      } else {
        slots.remove(*key);
        false
      }
    });
    before - self.order.len()
  }

  /// Index of the first entry not ordered before `(offset, gravity)`.
  fn lower_bound(&self, offset: usize, gravity: Gravity) -> usize {
    let slots = &self.slots;
    self
      .order
      .partition_point(|key| slots[*key].sort_key() < (offset, gravity))
  }

  /// Index right after the last entry at `(offset, gravity)`.
  fn upper_bound(&self, offset: usize, gravity: Gravity) -> usize {
    let slots = &self.slots;
    self
      .order
      .partition_point(|key| slots[*key].sort_key() <= (offset, gravity))
  }

  pub(crate) fn insert(&mut self, offset: usize, gravity: Gravity) -> LivePosition {
    self.prune();

    let token = Rc::new(());
    let key = self.slots.insert(Slot {
      offset,
      gravity,
      token: Rc::downgrade(&token),
    });
    let index = self.upper_bound(offset, gravity);
    self.order.insert(index, key);

    LivePosition {
      store: self.store,
      key,
      token,
    }
  }

  /// Index of `key` in `order`.
  fn find(&self, key: PositionKey) -> Option<usize> {
    let (offset, gravity) = self.get(key)?;
    let from = self.lower_bound(offset, gravity);
    let to = self.upper_bound(offset, gravity);
    self.order[from..to]
      .iter()
      .position(|k| *k == key)
      .map(|i| from + i)
  }

  /// Stops tracking `key`.
  ///
  /// # Panics
  ///
  /// Panics if `key` is not tracked by this list.
  pub(crate) fn remove(&mut self, key: PositionKey) {
    let Some(index) = self.find(key) else {
      panic!("position {key:?} is not registered with this store");
    };
    self.order.remove(index);
    self.slots.remove(key);
  }

  /// Moves an existing entry and restores its sorted slot.
  pub(crate) fn reposition(&mut self, key: PositionKey, offset: usize, gravity: Gravity) -> bool {
    let Some(index) = self.find(key) else {
      return false;
    };
    self.order.remove(index);
    let slot = &mut self.slots[key];
    slot.offset = offset;
    slot.gravity = gravity;
    let index = self.upper_bound(offset, gravity);
    self.order.insert(index, key);
    true
  }

  /// Rebases positions for an edit at `offset`.
  ///
  /// A positive `delta` is an insertion of that many symbols, a negative one
  /// the deletion of `offset..offset - delta`.
  ///
  /// Backward positions at `offset` never move. Positions inside a deleted
  /// span collapse onto `offset` with the Backward ones placed first.
  pub(crate) fn rebase(&mut self, offset: usize, delta: isize) {
    if delta == 0 {
      return;
    }
    let pruned = self.prune();

    let start = self.lower_bound(offset, Gravity::Forward);
    let mut index = start;

    if delta < 0 {
      let len = delta.unsigned_abs();
      let end = offset + len;
      // order[start..first_forward] holds collapsed Backward entries and
      // order[first_forward..index] collapsed Forward ones.
      let mut first_forward = start;

      while index < self.order.len() {
        let slot = &mut self.slots[self.order[index]];
        if slot.offset > end {
          break;
        }
        slot.offset = offset;
        if slot.gravity == Gravity::Backward {
          self.order.swap(first_forward, index);
          first_forward += 1;
        }
        index += 1;
      }

      for key in &self.order[index..] {
        self.slots[*key].offset -= len;
      }
    } else {
      let len = delta.unsigned_abs();
      for key in &self.order[start..] {
        self.slots[*key].offset += len;
      }
    }

    tracing::trace!(
      offset,
      delta,
      pruned,
      moved = self.order.len() - start,
      "rebased positions"
    );
    debug_assert!(self.is_sorted());
  }

  pub(crate) fn is_sorted(&self) -> bool {
    self
      .order
      .windows(2)
      .all(|pair| self.slots[pair[0]].sort_key() <= self.slots[pair[1]].sort_key())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn list() -> PositionList {
    PositionList::new(StoreId::next())
  }

  fn snapshot(list: &PositionList) -> Vec<(usize, Gravity)> {
    list.iter().collect()
  }

  use Gravity::*;

  #[test]
  fn insert_keeps_backward_first() {
    let mut list = list();
    let _a = list.insert(3, Forward);
    let _b = list.insert(3, Backward);
    let _c = list.insert(1, Forward);
    let _d = list.insert(3, Backward);
    assert_eq!(snapshot(&list), [
      (1, Forward),
      (3, Backward),
      (3, Backward),
      (3, Forward)
    ]);
  }

  #[test]
  fn dropped_handles_are_pruned_lazily() {
    let mut list = list();
    let keep = list.insert(2, Forward);
    drop(list.insert(1, Forward));
    assert_eq!(list.len(), 2);
    assert_eq!(snapshot(&list), [(2, Forward)]);

    let _other = list.insert(0, Backward);
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(keep.key()), Some((2, Forward)));
  }

  #[test]
  fn insertion_moves_forward_at_offset() {
    let mut list = list();
    let a = list.insert(2, Backward);
    let b = list.insert(2, Forward);
    let c = list.insert(1, Forward);
    list.rebase(2, 3);
    assert_eq!(list.get(a.key()), Some((2, Backward)));
    assert_eq!(list.get(b.key()), Some((5, Forward)));
    assert_eq!(list.get(c.key()), Some((1, Forward)));
    assert!(list.is_sorted());
  }

  #[test]
  fn deletion_collapses_with_backward_first() {
    let mut list = list();
    let at_forward = list.insert(1, Forward);
    let inner_forward = list.insert(2, Forward);
    let inner_backward = list.insert(3, Backward);
    let end_backward = list.insert(4, Backward);
    let after = list.insert(5, Forward);

    list.rebase(1, -3);

    assert_eq!(list.get(at_forward.key()), Some((1, Forward)));
    assert_eq!(list.get(inner_forward.key()), Some((1, Forward)));
    assert_eq!(list.get(inner_backward.key()), Some((1, Backward)));
    assert_eq!(list.get(end_backward.key()), Some((1, Backward)));
    assert_eq!(list.get(after.key()), Some((2, Forward)));
    assert_eq!(snapshot(&list), [
      (1, Backward),
      (1, Backward),
      (1, Forward),
      (1, Forward),
      (2, Forward)
    ]);
  }

  #[test]
  fn remove_exact_entry() {
    let mut list = list();
    let a = list.insert(1, Forward);
    let b = list.insert(1, Forward);
    list.remove(a.key());
    assert_eq!(list.get(a.key()), None);
    assert_eq!(list.get(b.key()), Some((1, Forward)));
    assert_eq!(list.len(), 1);
  }

  #[test]
  #[should_panic(expected = "not registered")]
  fn remove_unknown_panics() {
    let mut list = list();
    let a = list.insert(1, Forward);
    list.remove(a.key());
    list.remove(a.key());
  }

  #[test]
  fn reposition_resorts() {
    let mut list = list();
    let a = list.insert(1, Forward);
    let _b = list.insert(4, Backward);
    assert!(list.reposition(a.key(), 4, Forward));
    assert_eq!(snapshot(&list), [(4, Backward), (4, Forward)]);
    assert!(list.reposition(a.key(), 4, Backward));
    assert!(list.is_sorted());
  }
}
