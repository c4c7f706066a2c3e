//! Culture-aware string comparison used by the prefix search.
//!
//! Matching goes through the [`TextComparer`] trait so hosts can plug in a
//! locale library. Two comparers ship with the crate:
//!
//! - [`OrdinalComparer`] compares code points, optionally lowercased.
//! - [`FoldingComparer`] applies NFKC compatibility normalization, lowercases
//!   when case is ignored, and expands ligatures and digraphs (`ß` → `ss`,
//!   `æ` → `ae`, `œ` → `oe`).
//!
//! Because folding can change lengths, a match between an item text and a
//! typed prefix does not tell how much of the item text the prefix covers.
//! [`reconcile_prefix`] answers that by probing candidate lengths around the
//! prefix length.

use std::{
  borrow::Cow,
  cmp::Ordering,
  iter::once,
};

use serde::{
  Deserialize,
  Serialize,
};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// String operations the search engine needs from a locale library.
pub trait TextComparer {
  /// Whether `text` begins with `prefix`.
  fn starts_with(&self, text: &str, prefix: &str, ignore_case: bool) -> bool;

  /// Total order between `a` and `b`.
  fn compare(&self, a: &str, b: &str, ignore_case: bool) -> Ordering;

  fn equals(&self, a: &str, b: &str, ignore_case: bool) -> bool {
    self.compare(a, b, ignore_case) == Ordering::Equal
  }
}

/// Code point comparison. Ignoring case lowercases both sides.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalComparer;

impl TextComparer for OrdinalComparer {
  fn starts_with(&self, text: &str, prefix: &str, ignore_case: bool) -> bool {
    if !ignore_case {
      return text.starts_with(prefix);
    }

    let mut text = text.chars().flat_map(char::to_lowercase);
    prefix
      .chars()
      .flat_map(char::to_lowercase)
      .all(|c| text.next() == Some(c))
  }

  fn compare(&self, a: &str, b: &str, ignore_case: bool) -> Ordering {
    if !ignore_case {
      return a.cmp(b);
    }

    a.chars()
      .flat_map(char::to_lowercase)
      .cmp(b.chars().flat_map(char::to_lowercase))
  }
}

/// Compatibility-folding comparison.
///
/// Both sides are folded before comparing, so `"Straße"` starts with
/// `"STRASS"` when case is ignored, and `"ﬁle"` equals `"file"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldingComparer {
  /// Expand `ß`, `æ` and `œ` into their two-letter forms.
  pub expand_ligatures: bool,
}

impl Default for FoldingComparer {
  fn default() -> Self {
    Self {
      expand_ligatures: true,
    }
  }
}

impl FoldingComparer {
  /// Folds `text` into the form used for comparison.
  pub fn fold<'a>(&self, text: &'a str, ignore_case: bool) -> Cow<'a, str> {
    // ASCII is already in NFKC and has no ligatures.
    if text.is_ascii() {
      return if ignore_case && text.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(text.to_ascii_lowercase())
      } else {
        Cow::Borrowed(text)
      };
    }

    let mut folded = String::with_capacity(text.len());
    for c in text.nfkc() {
      if ignore_case {
        for lower in c.to_lowercase() {
          self.push_expanded(&mut folded, lower);
        }
      } else {
        self.push_expanded(&mut folded, c);
      }
    }
    Cow::Owned(folded)
  }

  fn push_expanded(&self, out: &mut String, c: char) {
    if !self.expand_ligatures {
      out.push(c);
      return;
    }

    match c {
      'ß' => out.push_str("ss"),
      'ẞ' => out.push_str("SS"),
      'æ' => out.push_str("ae"),
      'Æ' => out.push_str("AE"),
      'œ' => out.push_str("oe"),
      'Œ' => out.push_str("OE"),
      _ => out.push(c),
    }
  }
}

impl TextComparer for FoldingComparer {
  fn starts_with(&self, text: &str, prefix: &str, ignore_case: bool) -> bool {
    self
      .fold(text, ignore_case)
      .starts_with(self.fold(prefix, ignore_case).as_ref())
  }

  fn compare(&self, a: &str, b: &str, ignore_case: bool) -> Ordering {
    self.fold(a, ignore_case).cmp(&self.fold(b, ignore_case))
  }
}

/// Selects one of the built-in comparers from configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparerKind {
  #[default]
  Folding,
  Ordinal,
}

impl ComparerKind {
  pub fn build(self) -> Box<dyn TextComparer> {
    match self {
      ComparerKind::Folding => Box::new(FoldingComparer::default()),
      ComparerKind::Ordinal => Box::new(OrdinalComparer),
    }
  }
}

/// How much of a matched text the typed prefix accounts for.
///
/// Both lengths are in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSpan {
  /// Length of the part of the text that corresponds to the prefix.
  pub matched:   usize,
  /// Length of the text after the matched part.
  pub remaining: usize,
}

/// Finds the part of `text` that compares equal to `prefix`.
///
/// `text` is expected to start with `prefix` under `comparer`. Lengths are
/// probed at grapheme boundaries in the order `L, L+1, L-1, L+2, L-2, ...`
/// where `L` is the grapheme length of `prefix`, and the first candidate
/// whose text prefix equals `prefix` wins. A text shorter than the prefix
/// was compressed by the comparison and is matched entirely.
pub fn reconcile_prefix(
  comparer: &dyn TextComparer,
  text: &str,
  prefix: &str,
  ignore_case: bool,
) -> PrefixSpan {
  let total = text.chars().count();
  let boundaries: Vec<usize> = text
    .grapheme_indices(true)
    .map(|(idx, _)| idx)
    .chain(once(text.len()))
    .collect();
  let text_len = boundaries.len() - 1;
  let prefix_len = prefix.graphemes(true).count();

  if text_len < prefix_len {
    return PrefixSpan {
      matched:   total,
      remaining: 0,
    };
  }

  let span_at = |graphemes: usize| {
    let matched = text[..boundaries[graphemes]].chars().count();
    PrefixSpan {
      matched,
      remaining: total - matched,
    }
  };
  let equals_at =
    |graphemes: usize| comparer.equals(&text[..boundaries[graphemes]], prefix, ignore_case);

  if equals_at(prefix_len) {
    return span_at(prefix_len);
  }

  let reach = prefix_len.max(text_len - prefix_len);
  for distance in 1..=reach {
    let longer = prefix_len + distance;
    if longer <= text_len && equals_at(longer) {
      return span_at(longer);
    }
    if let Some(shorter) = prefix_len.checked_sub(distance)
      && shorter > 0
      && equals_at(shorter)
    {
      return span_at(shorter);
    }
  }

  // No exact length exists when the prefix ends inside an expansion, e.g.
  // "s" against "ßa". Take the shortest text prefix covering it.
  let covering = (1..=text_len)
    .find(|&graphemes| comparer.starts_with(&text[..boundaries[graphemes]], prefix, ignore_case))
    .unwrap_or(prefix_len);
  span_at(covering)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn ordinal_ignore_case() {
    let cmp = OrdinalComparer;
    assert!(cmp.starts_with("Apple", "ap", true));
    assert!(!cmp.starts_with("Apple", "ap", false));
    assert!(cmp.starts_with("Apple", "Ap", false));
    assert!(!cmp.starts_with("Ap", "App", true));
    assert!(cmp.equals("ÉCOLE", "école", true));
    assert_eq!(cmp.compare("a", "B", true), Ordering::Less);
    assert_eq!(cmp.compare("a", "B", false), Ordering::Greater);
  }

  #[test]
  fn folding_expands_sharp_s() {
    let cmp = FoldingComparer::default();
    assert!(cmp.starts_with("Straße", "strass", true));
    assert!(cmp.starts_with("Straße", "STRASSE", true));
    assert!(cmp.equals("ß", "ss", true));
    assert!(!FoldingComparer {
      expand_ligatures: false,
    }
    .equals("ß", "ss", true));
  }

  #[test]
  fn folding_normalizes_compatibility_forms() {
    let cmp = FoldingComparer::default();
    assert!(cmp.equals("ﬁle", "file", false));
    // precomposed vs combining acute
    assert!(cmp.equals("caf\u{e9}", "cafe\u{301}", false));
    assert!(cmp.starts_with("Æther", "aeth", true));
  }

  #[test]
  fn fold_borrows_plain_ascii() {
    let cmp = FoldingComparer::default();
    assert!(matches!(cmp.fold("abc", true), Cow::Borrowed("abc")));
    assert!(matches!(cmp.fold("abc", false), Cow::Borrowed(_)));
    assert_eq!(cmp.fold("ABC", true), "abc");
  }

  #[test]
  fn reconcile_same_length() {
    let span = reconcile_prefix(&OrdinalComparer, "Apple", "ap", true);
    assert_eq!(span, PrefixSpan {
      matched:   2,
      remaining: 3,
    });
  }

  #[test]
  fn reconcile_text_contracted_by_expansion() {
    // "strass" folds against "Straß", one char shorter than the prefix
    let span = reconcile_prefix(&FoldingComparer::default(), "Straße", "strass", true);
    assert_eq!(span, PrefixSpan {
      matched:   5,
      remaining: 1,
    });
  }

  #[test]
  fn reconcile_prefix_contracted_by_expansion() {
    // the typed "æ" covers two chars of the item text
    let span = reconcile_prefix(&FoldingComparer::default(), "Aether", "æ", true);
    assert_eq!(span, PrefixSpan {
      matched:   2,
      remaining: 4,
    });
  }

  #[test]
  fn reconcile_compressed_text_is_matched_whole() {
    let span = reconcile_prefix(&FoldingComparer::default(), "ß", "ss", true);
    assert_eq!(span, PrefixSpan {
      matched:   1,
      remaining: 0,
    });
  }

  #[test]
  fn reconcile_prefix_inside_expansion() {
    let span = reconcile_prefix(&FoldingComparer::default(), "ßa", "s", true);
    assert_eq!(span, PrefixSpan {
      matched:   1,
      remaining: 1,
    });
  }

  #[test]
  fn reconcile_counts_graphemes_not_chars() {
    // "e" + combining acute is one grapheme but two chars
    let span = reconcile_prefix(&FoldingComparer::default(), "cafe\u{301}s", "caf\u{e9}", false);
    assert_eq!(span, PrefixSpan {
      matched:   5,
      remaining: 1,
    });
  }

  quickcheck::quickcheck! {
      fn reconcile_ordinal_matches_prefix_length(text: String, split: usize) -> bool {
          if text.is_empty() {
              return true;
          }
          let graphemes: Vec<&str> = text.graphemes(true).collect();
          let take = split % graphemes.len() + 1;
          let prefix: String = graphemes[..take].concat();
          let span = reconcile_prefix(&OrdinalComparer, &text, &prefix, false);
          span.matched == prefix.chars().count()
              && span.matched + span.remaining == text.chars().count()
      }
  }
}
