//! Items and the collections that hold them.
//!
//! The search engine never owns items. It reads them through a
//! [`SearchHost`], which also receives navigation requests, and asks each
//! [`SearchItem`] for its primary text.

use std::borrow::Cow;

use serde_json::Value;

use crate::compare::TextComparer;

/// Something that can be matched by typing.
///
/// The primary text of an item is resolved in this order:
///
/// 1. [`search_text`](Self::search_text), an explicit override
/// 2. [`field`](Self::field) at the configured text path, when one is set
/// 3. [`plain_text`](Self::plain_text) for items that render text
/// 4. [`display_text`](Self::display_text)
pub trait SearchItem {
  fn search_text(&self) -> Option<Cow<'_, str>> {
    None
  }

  /// Value found by following `path` into the item's data.
  fn field(&self, path: &str) -> Option<Cow<'_, str>> {
    let _ = path;
    None
  }

  fn plain_text(&self) -> Option<Cow<'_, str>> {
    None
  }

  fn display_text(&self) -> Cow<'_, str>;
}

/// Resolves the text an item is matched against.
///
/// Returns `None` for items without text. Empty text never matches, so it is
/// reported as `None` as well.
pub fn primary_text<'a, I: SearchItem + ?Sized>(
  item: &'a I,
  text_path: Option<&str>,
) -> Option<Cow<'a, str>> {
  if let Some(text) = item.search_text().filter(|text| !text.is_empty()) {
    return Some(text);
  }

  let text = match text_path {
    // A configured path is authoritative, even when it resolves to nothing.
    Some(path) => {
      let value = item.field(path);
      if value.is_none() {
        tracing::trace!(path, "text path did not resolve");
      }
      value
    },
    None => item.plain_text().or_else(|| Some(item.display_text())),
  };

  text.filter(|text| !text.is_empty())
}

impl SearchItem for str {
  fn display_text(&self) -> Cow<'_, str> {
    Cow::Borrowed(self)
  }
}

impl SearchItem for String {
  fn display_text(&self) -> Cow<'_, str> {
    Cow::Borrowed(self)
  }
}

impl SearchItem for &str {
  fn display_text(&self) -> Cow<'_, str> {
    Cow::Borrowed(self)
  }
}

impl SearchItem for Value {
  /// Follows a dotted path of object keys and array indices, e.g.
  /// `"person.names.0"`.
  fn field(&self, path: &str) -> Option<Cow<'_, str>> {
    let mut value = self;
    for segment in path.split('.').filter(|segment| !segment.is_empty()) {
      value = match value {
        Value::Object(map) => map.get(segment)?,
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
        _ => return None,
      };
    }
    value_text(value)
  }

  fn display_text(&self) -> Cow<'_, str> {
    value_text(self).unwrap_or(Cow::Borrowed(""))
  }
}

fn value_text(value: &Value) -> Option<Cow<'_, str>> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(Cow::Borrowed(s)),
    other => Some(Cow::Owned(other.to_string())),
  }
}

/// The collection a search runs over, plus where match results go.
///
/// Indices must stay stable for the duration of a single call into the
/// engine.
pub trait SearchHost {
  type Item: SearchItem + ?Sized;

  fn item_count(&self) -> usize;

  fn item_at(&self, index: usize) -> Option<&Self::Item>;

  /// Called when a search lands on a different item.
  fn navigate_to(&mut self, index: usize);

  /// Overrides the configured text path.
  fn text_path(&self) -> Option<&str> {
    None
  }

  /// Overrides the configured case sensitivity.
  fn is_case_sensitive(&self) -> Option<bool> {
    None
  }

  /// Overrides the engine's comparer.
  fn comparer(&self) -> Option<&dyn TextComparer> {
    None
  }
}

/// A plain list host that remembers the item it was navigated to.
#[derive(Debug, Clone, Default)]
pub struct ListHost<T> {
  items:    Vec<T>,
  selected: Option<usize>,
}

impl<T: SearchItem> ListHost<T> {
  pub fn new(items: Vec<T>) -> Self {
    Self {
      items,
      selected: None,
    }
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  pub fn selected(&self) -> Option<usize> {
    self.selected
  }

  pub fn selected_item(&self) -> Option<&T> {
    self.items.get(self.selected?)
  }
}

impl<T: SearchItem> FromIterator<T> for ListHost<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

impl<T: SearchItem> SearchHost for ListHost<T> {
  type Item = T;

  fn item_count(&self) -> usize {
    self.items.len()
  }

  fn item_at(&self, index: usize) -> Option<&T> {
    self.items.get(index)
  }

  fn navigate_to(&mut self, index: usize) {
    self.selected = Some(index);
  }
}
