//! Keystroke sequences against a list host.

use std::{
  borrow::Cow,
  time::Duration,
};

use the_search::{
  ListHost,
  ManualClock,
  PrefixSearch,
  SearchConfig,
  SearchHost,
  SearchItem,
  TextComparer,
};

fn engine() -> (PrefixSearch<ManualClock>, ManualClock) {
  let clock = ManualClock::new();
  (
    PrefixSearch::with_clock(SearchConfig::default(), clock.clone()),
    clock,
  )
}

#[test]
fn extending_prefix_keeps_first_match() {
  let (mut search, _) = engine();
  let mut host = ListHost::new(vec!["Apple", "Apricot", "Banana"]);

  assert!(search.search(&mut host, "a"));
  assert_eq!(search.matched_index(), Some(0));
  assert_eq!(search.prefix(), "a");

  assert!(search.search(&mut host, "p"));
  assert_eq!(search.matched_index(), Some(0));
  assert_eq!(search.prefix(), "ap");
  assert_eq!(host.selected(), Some(0));
}

#[test]
fn repeated_character_cycles() {
  let (mut search, _) = engine();
  let mut host = ListHost::new(vec!["Apple", "Apricot", "Avocado"]);

  let mut visited = Vec::new();
  for _ in 0..4 {
    assert!(search.search(&mut host, "a"));
    visited.push(host.selected().unwrap());
  }

  assert_eq!(visited, [0, 1, 2, 0]);
  assert_eq!(search.prefix(), "a");
  assert_eq!(search.chars_entered().len(), 1);
}

#[test]
fn cycling_skips_items_without_prefix() {
  let (mut search, _) = engine();
  let mut host = ListHost::new(vec!["bat", "Ant", "cow", "axe", "Bee"]);

  assert!(search.search(&mut host, "b"));
  assert_eq!(host.selected(), Some(0));
  assert!(search.search(&mut host, "b"));
  assert_eq!(host.selected(), Some(4));
  assert!(search.search(&mut host, "b"));
  assert_eq!(host.selected(), Some(0));
}

#[test]
fn timeout_starts_over() {
  let (mut search, clock) = engine();
  let mut host = ListHost::new(vec!["Apple", "Banana", "Bread"]);

  assert!(search.search(&mut host, "b"));
  assert_eq!(host.selected(), Some(1));

  clock.advance(Duration::from_millis(1500));
  // without the timeout this would look for "br"
  assert!(search.search(&mut host, "a"));
  assert_eq!(host.selected(), Some(0));
  assert_eq!(search.prefix(), "a");
}

#[test]
fn timeout_before_expiry_extends_prefix() {
  let (mut search, clock) = engine();
  let mut host = ListHost::new(vec!["Apple", "Banana", "Bread"]);

  assert!(search.search(&mut host, "b"));
  clock.advance(Duration::from_millis(999));
  assert!(search.search(&mut host, "r"));
  assert_eq!(host.selected(), Some(2));
  assert_eq!(search.prefix(), "br");
}

#[test]
fn on_timeout_resets_everything() {
  let (mut search, _) = engine();
  let mut host = ListHost::new(vec!["Apple"]);
  assert!(search.search(&mut host, "a"));

  search.on_timeout();
  assert!(!search.is_active());
  assert_eq!(search.prefix(), "");
  assert_eq!(search.matched_index(), None);
  assert!(search.chars_entered().is_empty());
  assert_eq!(search.deadline(), None);
}

#[test]
fn backspace_restores_shorter_prefix() {
  let (mut search, _) = engine();
  let mut host = ListHost::new(vec!["Apple", "Apricot", "Banana"]);

  assert!(search.search(&mut host, "a"));
  assert!(search.search(&mut host, "p"));
  assert_eq!(search.prefix(), "ap");

  assert!(search.backspace(&mut host));
  assert_eq!(search.prefix(), "a");
  assert_eq!(search.matched_index(), Some(0));
}

#[test]
fn empty_collection_never_matches() {
  let (mut search, _) = engine();
  let mut host: ListHost<&str> = ListHost::new(Vec::new());

  for keystroke in ["a", "a", "b", ""] {
    assert!(!search.search(&mut host, keystroke));
    assert!(!search.is_active());
    assert_eq!(search.prefix(), "");
    assert_eq!(search.matched_index(), None);
  }
  assert_eq!(host.selected(), None);
  assert!(search.match_prefix(&host, "a").is_none());
}

/// A host whose items expose text only through a visual element.
struct Menu {
  entries:    Vec<MenuEntry>,
  navigation: Vec<usize>,
}

struct MenuEntry {
  caption: &'static str,
  hotkey:  Option<&'static str>,
}

impl SearchItem for MenuEntry {
  fn search_text(&self) -> Option<Cow<'_, str>> {
    self.hotkey.map(Cow::Borrowed)
  }

  fn plain_text(&self) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(self.caption))
  }

  fn display_text(&self) -> Cow<'_, str> {
    Cow::Borrowed("MenuEntry")
  }
}

impl SearchHost for Menu {
  type Item = MenuEntry;

  fn item_count(&self) -> usize {
    self.entries.len()
  }

  fn item_at(&self, index: usize) -> Option<&MenuEntry> {
    self.entries.get(index)
  }

  fn navigate_to(&mut self, index: usize) {
    self.navigation.push(index);
  }
}

#[test]
fn custom_host_sees_each_navigation_once() {
  let (mut search, _) = engine();
  let mut menu = Menu {
    entries:    vec![
      MenuEntry {
        caption: "Open",
        hotkey:  None,
      },
      MenuEntry {
        caption: "Save",
        hotkey:  Some("Write"),
      },
      MenuEntry {
        caption: "Save As",
        hotkey:  None,
      },
    ],
    navigation: Vec::new(),
  };

  assert!(search.search(&mut menu, "s"));
  // the hotkey text hides the caption of the second entry
  assert_eq!(menu.navigation, [2]);
  assert!(search.search(&mut menu, "a"));
  assert_eq!(menu.navigation, [2]);
  assert!(search.search(&mut menu, "v"));
  assert_eq!(menu.navigation, [2]);

  search.reset();
  assert!(search.search(&mut menu, "w"));
  assert_eq!(menu.navigation, [2, 1]);
}

struct ReverseComparer;

impl TextComparer for ReverseComparer {
  fn starts_with(&self, text: &str, prefix: &str, _ignore_case: bool) -> bool {
    text.ends_with(prefix)
  }

  fn compare(&self, a: &str, b: &str, _ignore_case: bool) -> std::cmp::Ordering {
    a.cmp(b)
  }
}

#[test]
fn custom_comparer_replaces_config_choice() {
  let mut search = PrefixSearch::with_clock(SearchConfig::default(), ManualClock::new())
    .with_comparer(Box::new(ReverseComparer));
  let mut host = ListHost::new(vec!["cat", "dog"]);
  assert!(search.search(&mut host, "g"));
  assert_eq!(host.selected(), Some(1));
}

/// A list whose own settings take precedence over the engine config.
struct StrictList {
  inner: ListHost<serde_json::Value>,
}

impl SearchHost for StrictList {
  type Item = serde_json::Value;

  fn item_count(&self) -> usize {
    self.inner.item_count()
  }

  fn item_at(&self, index: usize) -> Option<&serde_json::Value> {
    self.inner.item_at(index)
  }

  fn navigate_to(&mut self, index: usize) {
    self.inner.navigate_to(index);
  }

  fn text_path(&self) -> Option<&str> {
    Some("label")
  }

  fn is_case_sensitive(&self) -> Option<bool> {
    Some(true)
  }
}

#[test]
fn host_settings_override_config() {
  let (mut search, _) = engine();
  let mut host = StrictList {
    inner: ListHost::new(vec![
      serde_json::json!({ "label": "apple", "id": "Banana" }),
      serde_json::json!({ "label": "Apple", "id": "cherry" }),
    ]),
  };

  assert!(!search.search(&mut host, "b"));
  assert!(search.search(&mut host, "A"));
  assert_eq!(host.inner.selected(), Some(1));
  assert_eq!(search.primary_text(&host, 0).as_deref(), Some("apple"));
}

quickcheck::quickcheck! {
    fn matched_item_starts_with_prefix(items: Vec<String>, keys: Vec<u8>) -> bool {
        let clock = ManualClock::new();
        let mut search = PrefixSearch::with_clock(SearchConfig::default(), clock);
        let mut host = ListHost::new(items);
        for key in keys {
            let key = char::from(b'a' + key % 4);
            let mut buf = [0; 4];
            search.search(&mut host, key.encode_utf8(&mut buf));
            if let Some(index) = search.matched_index() {
                let text = search.primary_text(&host, index).unwrap_or_default();
                let prefix = search.prefix();
                let cmp = the_search::FoldingComparer::default();
                if !prefix.is_empty() && !cmp.starts_with(&text, prefix, true) {
                    return false;
                }
            }
        }
        true
    }
}
