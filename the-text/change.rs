//! Change records and the listeners that observe them.

use std::ops::Range;

use smallvec::SmallVec;

use crate::TextStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
  ContentAdded,
  ContentRemoved,
}

/// One primitive edit, in the coordinates of the buffer at the time it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeRecord {
  pub kind:   ChangeKind,
  pub offset: usize,
  pub len:    usize,
}

impl ChangeRecord {
  pub fn added(offset: usize, len: usize) -> Self {
    Self {
      kind: ChangeKind::ContentAdded,
      offset,
      len,
    }
  }

  pub fn removed(offset: usize, len: usize) -> Self {
    Self {
      kind: ChangeKind::ContentRemoved,
      offset,
      len,
    }
  }

  /// Where `pos` ends up after this edit. Inserted text lands after `pos`
  /// only when `pos` lies before the insertion point.
  fn map(&self, pos: usize) -> usize {
    match self.kind {
      ChangeKind::ContentAdded if pos > self.offset => pos + self.len,
      ChangeKind::ContentAdded => pos,
      ChangeKind::ContentRemoved if pos >= self.offset + self.len => pos - self.len,
      ChangeKind::ContentRemoved => pos.min(self.offset),
    }
  }
}

/// Every edit made inside one outermost change bracket, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeEvent {
  records: SmallVec<[ChangeRecord; 4]>,
}

impl ChangeEvent {
  pub fn records(&self) -> &[ChangeRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub(crate) fn push(&mut self, record: ChangeRecord) {
    self.records.push(record);
  }

  /// Smallest range of the final buffer covering every inserted symbol and
  /// every point where symbols were removed.
  pub fn span(&self) -> Option<Range<usize>> {
    let mut span: Option<Range<usize>> = None;
    for record in &self.records {
      let touched = match record.kind {
        ChangeKind::ContentAdded => record.offset..record.offset + record.len,
        ChangeKind::ContentRemoved => record.offset..record.offset,
      };
      span = Some(match span {
        Some(range) => {
          let start = record.map(range.start);
          let end = record.map(range.end);
          start.min(touched.start)..end.max(touched.end)
        },
        None => touched,
      });
    }
    span
  }
}

impl<'a> IntoIterator for &'a ChangeEvent {
  type Item = &'a ChangeRecord;
  type IntoIter = std::slice::Iter<'a, ChangeRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.records.iter()
  }
}

/// Returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub(crate) type ChangingListener = Box<dyn FnMut(&TextStore)>;
pub(crate) type ChangeListener = Box<dyn FnMut(&mut TextStore, &ChangeRecord)>;
pub(crate) type ChangedListener = Box<dyn FnMut(&TextStore, &ChangeEvent)>;

#[derive(Default)]
pub(crate) struct Listeners {
  next_id:             u64,
  pub(crate) changing: Vec<(ListenerId, ChangingListener)>,
  pub(crate) change:   Vec<(ListenerId, ChangeListener)>,
  pub(crate) changed:  Vec<(ListenerId, ChangedListener)>,
  /// Change listeners taken out for the dispatch in progress.
  in_flight:           Vec<ListenerId>,
  /// In-flight listeners unregistered during that dispatch.
  retired:             Vec<ListenerId>,
}

impl Listeners {
  pub(crate) fn next_id(&mut self) -> ListenerId {
    let id = ListenerId(self.next_id);
    self.next_id += 1;
    id
  }

  pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
    let before = self.changing.len() + self.change.len() + self.changed.len();
    self.changing.retain(|(other, _)| *other != id);
    self.change.retain(|(other, _)| *other != id);
    self.changed.retain(|(other, _)| *other != id);
    if before != self.changing.len() + self.change.len() + self.changed.len() {
      return true;
    }
    if self.in_flight.contains(&id) && !self.retired.contains(&id) {
      self.retired.push(id);
      return true;
    }
    false
  }

  /// Takes the change listeners out for a dispatch that may register or
  /// remove listeners.
  pub(crate) fn take_change(&mut self) -> Vec<(ListenerId, ChangeListener)> {
    let taken = std::mem::take(&mut self.change);
    self.in_flight = taken.iter().map(|(id, _)| *id).collect();
    taken
  }

  /// Puts dispatched listeners back ahead of any registered meanwhile.
  pub(crate) fn restore_change(&mut self, mut taken: Vec<(ListenerId, ChangeListener)>) {
    let retired = std::mem::take(&mut self.retired);
    taken.retain(|(id, _)| !retired.contains(id));
    taken.append(&mut self.change);
    self.change = taken;
    self.in_flight.clear();
  }

  pub(crate) fn len(&self) -> usize {
    self.changing.len() + self.change.len() + self.changed.len()
  }
}
