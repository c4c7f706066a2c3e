//! Incremental type-ahead search over an item collection.
//!
//! Each keystroke extends a prefix and moves the host to the first item whose
//! primary text starts with it. Scanning begins at the currently matched item
//! and wraps around the collection once, so the earliest match at or after
//! the current item wins.
//!
//! Typing the same character again when the longer prefix matches nothing
//! cycles through the items that match the existing prefix:
//!
//! ```ignore
//! let mut host = ListHost::new(vec!["Apple", "Apricot", "Avocado"]);
//! let mut search = PrefixSearch::new(SearchConfig::default());
//!
//! search.search(&mut host, "a"); // Apple
//! search.search(&mut host, "a"); // "aa" matches nothing: Apricot
//! search.search(&mut host, "a"); // Avocado
//! search.search(&mut host, "a"); // wraps back to Apple
//! ```
//!
//! State is forgotten when no keystroke arrives within the configured
//! timeout.

use std::time::Instant;

use smartstring::{
  LazyCompact,
  SmartString,
};

use crate::{
  SearchConfig,
  compare::{
    PrefixSpan,
    TextComparer,
    reconcile_prefix,
  },
  item::{
    SearchHost,
    primary_text,
  },
  timeout::{
    Clock,
    SystemClock,
    Timeout,
  },
};

/// Text produced by a single input event.
pub type Keystroke = SmartString<LazyCompact>;

/// Result of a one-shot [`PrefixSearch::match_prefix`] query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedText {
  pub index:              usize,
  pub text:               String,
  /// Chars of `text` that correspond to the queried prefix.
  pub matched_prefix_len: usize,
  /// Chars of `text` after the matched prefix.
  pub remaining_len:      usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScanMatch {
  index:          usize,
  used_new_chars: bool,
}

/// Matching rules shared by every scan of one engine.
struct Matcher<'a> {
  comparer:    &'a dyn TextComparer,
  ignore_case: bool,
  text_path:   Option<&'a str>,
}

impl Matcher<'_> {
  /// Scans the collection once, starting at `start` and wrapping around.
  ///
  /// Returns the first item starting with `prefix + next`. When `fallback`
  /// is set and that finds nothing, returns the first item after the start
  /// item that starts with `prefix` alone.
  fn scan<H: SearchHost + ?Sized>(
    &self,
    host: &H,
    prefix: &str,
    next: &str,
    start: usize,
    fallback: bool,
  ) -> Option<ScanMatch> {
    let count = host.item_count();
    if count == 0 {
      return None;
    }

    let new_prefix = format!("{prefix}{next}");
    if new_prefix.is_empty() {
      return None;
    }

    let start = if start < count { start } else { 0 };
    let look_for_fallback = fallback && !prefix.is_empty();
    let mut fallback_index = None;
    let mut index = start;

    loop {
      let text = host
        .item_at(index)
        .and_then(|item| primary_text(item, self.text_path));

      if let Some(text) = text {
        if self
          .comparer
          .starts_with(&text, &new_prefix, self.ignore_case)
        {
          return Some(ScanMatch {
            index,
            used_new_chars: true,
          });
        }

        // The start item never counts as a fallback, otherwise repeating a
        // character would never leave it.
        if look_for_fallback
          && index != start
          && fallback_index.is_none()
          && self.comparer.starts_with(&text, prefix, self.ignore_case)
        {
          fallback_index = Some(index);
        }
      }

      index += 1;
      if index == count {
        index = 0;
      }
      if index == start {
        break;
      }
    }

    fallback_index.map(|index| ScanMatch {
      index,
      used_new_chars: false,
    })
  }
}

/// Type-ahead state for one host collection.
pub struct PrefixSearch<C: Clock = SystemClock> {
  config:        SearchConfig,
  comparer:      Box<dyn TextComparer>,
  clock:         C,
  timeout:       Timeout,
  prefix:        String,
  chars_entered: Vec<Keystroke>,
  matched_index: Option<usize>,
  is_active:     bool,
}

impl PrefixSearch<SystemClock> {
  pub fn new(config: SearchConfig) -> Self {
    Self::with_clock(config, SystemClock)
  }
}

impl<C: Clock> PrefixSearch<C> {
  pub fn with_clock(config: SearchConfig, clock: C) -> Self {
    let comparer = config.comparer.build();
    let timeout = Timeout::new(config.timeout());
    Self {
      config,
      comparer,
      clock,
      timeout,
      prefix: String::new(),
      chars_entered: Vec::new(),
      matched_index: None,
      is_active: false,
    }
  }

  /// Replaces the comparer selected by the config, e.g. with one backed by a
  /// locale library.
  #[must_use]
  pub fn with_comparer(mut self, comparer: Box<dyn TextComparer>) -> Self {
    self.comparer = comparer;
    self
  }

  pub fn config(&self) -> &SearchConfig {
    &self.config
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  pub fn chars_entered(&self) -> &[Keystroke] {
    &self.chars_entered
  }

  pub fn is_active(&self) -> bool {
    self.is_active
  }

  /// Index of the matched item. Only meaningful while active.
  pub fn matched_index(&self) -> Option<usize> {
    self.matched_index.filter(|_| self.is_active)
  }

  /// When the typed prefix will be forgotten, if a search is in progress.
  ///
  /// Event-loop hosts can schedule a wakeup for this instant and call
  /// [`poll`](Self::poll).
  pub fn deadline(&self) -> Option<Instant> {
    self.timeout.deadline()
  }

  fn matcher<'a, H: SearchHost + ?Sized>(&'a self, host: &'a H) -> Matcher<'a> {
    let case_sensitive = host
      .is_case_sensitive()
      .unwrap_or(self.config.case_sensitive);
    Matcher {
      comparer:    host.comparer().unwrap_or(self.comparer.as_ref()),
      ignore_case: !case_sensitive,
      text_path:   host.text_path().or(self.config.text_path.as_deref()),
    }
  }

  /// Feeds the text of one input event into the search.
  ///
  /// Returns whether an item matched. An unmatched keystroke leaves the
  /// prefix and the current match untouched.
  pub fn search<H: SearchHost + ?Sized>(&mut self, host: &mut H, next_chars: &str) -> bool {
    self.poll();

    if next_chars.is_empty() {
      return false;
    }

    let start = match self.matched_index {
      Some(index) if self.is_active => index,
      _ => 0,
    };

    let found = {
      let matcher = self.matcher(&*host);
      let repeated_char = self
        .chars_entered
        .last()
        .is_some_and(|last| matcher.comparer.equals(last, next_chars, true));
      let found = matcher.scan(&*host, &self.prefix, next_chars, start, repeated_char);

      tracing::trace!(
        prefix = %self.prefix,
        next_chars,
        start,
        repeated_char,
        ?found,
        "type-ahead scan"
      );
      found
    };

    if let Some(found) = found {
      if !self.is_active || found.index != start {
        host.navigate_to(found.index);
      }
      self.matched_index = Some(found.index);

      if found.used_new_chars {
        self.prefix.push_str(next_chars);
        self.chars_entered.push(Keystroke::from(next_chars));
      }

      self.is_active = true;
    }

    if self.is_active {
      self.timeout.restart(self.clock.now());
    }

    found.is_some()
  }

  /// Removes the most recent keystroke from the prefix.
  ///
  /// The match moves to whatever the shortened prefix alone matches. Returns
  /// whether anything was removed.
  pub fn backspace<H: SearchHost + ?Sized>(&mut self, host: &mut H) -> bool {
    self.poll();

    if !self.is_active {
      return false;
    }
    let Some(last) = self.chars_entered.pop() else {
      return false;
    };

    debug_assert!(self.prefix.ends_with(last.as_str()));
    let len = self.prefix.len() - last.len();
    self.prefix.truncate(len);
    self.timeout.restart(self.clock.now());

    if self.prefix.is_empty() {
      return true;
    }

    let found = self.matcher(&*host).scan(&*host, &self.prefix, "", 0, false);
    if let Some(found) = found
      && self.matched_index != Some(found.index)
    {
      host.navigate_to(found.index);
      self.matched_index = Some(found.index);
    }

    true
  }

  /// Looks up the first item starting with `prefix` without touching the
  /// search state.
  pub fn match_prefix<H: SearchHost + ?Sized>(&self, host: &H, prefix: &str) -> Option<MatchedText> {
    let matcher = self.matcher(host);
    let found = matcher.scan(host, prefix, "", 0, false)?;
    let item = host.item_at(found.index)?;
    let text = primary_text(item, matcher.text_path)?.into_owned();

    let PrefixSpan { matched, remaining } =
      reconcile_prefix(matcher.comparer, &text, prefix, matcher.ignore_case);

    Some(MatchedText {
      index: found.index,
      text,
      matched_prefix_len: matched,
      remaining_len: remaining,
    })
  }

  /// Primary text of the item at `index`.
  pub fn primary_text<H: SearchHost + ?Sized>(&self, host: &H, index: usize) -> Option<String> {
    let item = host.item_at(index)?;
    primary_text(item, self.matcher(host).text_path).map(|text| text.into_owned())
  }

  /// Forgets the prefix if the timeout has passed. Returns whether it did.
  pub fn poll(&mut self) -> bool {
    if self.timeout.is_expired(self.clock.now()) {
      self.on_timeout();
      return true;
    }
    false
  }

  /// Timer callback for hosts that drive the timeout themselves.
  pub fn on_timeout(&mut self) {
    tracing::debug!(prefix = %self.prefix, "type-ahead timed out");
    self.reset();
  }

  /// Clears all typed state.
  pub fn reset(&mut self) {
    self.is_active = false;
    self.prefix.clear();
    self.chars_entered.clear();
    self.matched_index = None;
    self.timeout.cancel();
  }
}
