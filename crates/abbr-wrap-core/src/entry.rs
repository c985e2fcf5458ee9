//! Abbreviation entry model.
//!
//! An [`AbbreviationEntry`] is the validated form the matcher consumes.
//! [`RawEntry`] is the stored shape before sanitization and accepts both the
//! legacy three-element array (`["FYI", "For Your Information", ""]`) and a
//! table with named fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single abbreviation with its expansion and optional language code.
///
/// `lang` follows the empty-means-absent convention: an empty string tells
/// the annotator to omit the `lang` attribute so the element inherits the
/// page language. Use [`AbbreviationEntry::lang`] to read it as an `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AbbreviationEntry {
    /// The literal abbreviation token (e.g. "FYI").
    pub short: String,
    /// The long form, rendered as the annotation's `title`.
    pub expansion: String,
    /// Language code of the expansion; empty inherits the page language.
    #[serde(default)]
    pub lang: String,
}

impl AbbreviationEntry {
    /// Create an entry. Pass an empty `lang` to inherit the page language.
    pub fn new(
        short: impl Into<String>,
        expansion: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            short: short.into(),
            expansion: expansion.into(),
            lang: lang.into(),
        }
    }

    /// Language code, or `None` when the page language applies.
    pub fn lang(&self) -> Option<&str> {
        if self.lang.is_empty() {
            None
        } else {
            Some(&self.lang)
        }
    }

    /// Whether both required fields are non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.short.is_empty() && !self.expansion.is_empty()
    }
}

/// Ordered list of abbreviation entries.
///
/// Uniqueness of `short` is established by
/// [`sanitize_entries`](crate::sanitize::sanitize_entries); the list itself
/// does not re-check it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AbbreviationList(Vec<AbbreviationEntry>);

impl AbbreviationList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Borrow the entries in order.
    pub fn entries(&self) -> &[AbbreviationEntry] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, AbbreviationEntry> {
        self.0.iter()
    }

    /// Consume the list and return the entries.
    pub fn into_inner(self) -> Vec<AbbreviationEntry> {
        self.0
    }
}

impl From<Vec<AbbreviationEntry>> for AbbreviationList {
    fn from(entries: Vec<AbbreviationEntry>) -> Self {
        Self(entries)
    }
}

impl AsRef<[AbbreviationEntry]> for AbbreviationList {
    fn as_ref(&self) -> &[AbbreviationEntry] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a AbbreviationList {
    type Item = &'a AbbreviationEntry;
    type IntoIter = std::slice::Iter<'a, AbbreviationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An abbreviation as stored or submitted, before sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RawEntry {
    /// Legacy `[short, expansion, lang]` array. Missing elements read as empty.
    Tuple(Vec<String>),
    /// Table form with named fields.
    Table {
        /// The abbreviation.
        short: String,
        /// The expansion.
        expansion: String,
        /// Optional language code.
        #[serde(default)]
        lang: Option<String>,
    },
}

impl RawEntry {
    /// The unsanitized abbreviation.
    pub fn short(&self) -> &str {
        match self {
            Self::Tuple(fields) => fields.first().map_or("", String::as_str),
            Self::Table { short, .. } => short,
        }
    }

    /// The unsanitized expansion.
    pub fn expansion(&self) -> &str {
        match self {
            Self::Tuple(fields) => fields.get(1).map_or("", String::as_str),
            Self::Table { expansion, .. } => expansion,
        }
    }

    /// The unsanitized language code (empty when absent).
    pub fn lang(&self) -> &str {
        match self {
            Self::Tuple(fields) => fields.get(2).map_or("", String::as_str),
            Self::Table { lang, .. } => lang.as_deref().unwrap_or(""),
        }
    }
}

impl From<AbbreviationEntry> for RawEntry {
    fn from(entry: AbbreviationEntry) -> Self {
        Self::Table {
            short: entry.short,
            expansion: entry.expansion,
            lang: (!entry.lang.is_empty()).then_some(entry.lang),
        }
    }
}
