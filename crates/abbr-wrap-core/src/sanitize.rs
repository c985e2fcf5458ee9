//! Ingestion-side cleanup of abbreviation entries.
//!
//! Stored entries come from hand-edited config files or tool parameters, so
//! every field is run through [`sanitize_text_field`] and the list is reduced
//! to well-formed entries with unique abbreviations. The first occurrence of
//! an abbreviation wins; later duplicates are reported, not merged.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entry::{AbbreviationEntry, AbbreviationList, RawEntry};
use crate::error::SkipReason;

/// `<script>` and `<style>` elements, removed together with their content.
static SCRIPT_STYLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>")
        .expect("valid regex")
});

/// Any complete markup tag.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("valid regex"));

/// Percent-encoded octets (`%20`, `%3C`, ...).
static OCTET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[0-9a-fA-F]{2}").expect("valid regex"));

/// An entry that was dropped during sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkippedEntry {
    /// Position of the entry in the submitted list.
    pub index: usize,
    /// The abbreviation after sanitization (may be empty).
    pub short: String,
    /// Why the entry was dropped.
    pub reason: SkipReason,
}

/// Result of sanitizing a submitted list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SanitizeReport {
    /// Entries that survived, in submission order.
    pub entries: AbbreviationList,
    /// Entries that were dropped.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped: Vec<SkippedEntry>,
}

/// Clean a single text field for storage.
///
/// Removes markup (including `<script>`/`<style>` bodies), encodes any
/// stray `<` as `&lt;`, drops percent-encoded octets, collapses every
/// whitespace run (line breaks and tabs included) to a single space, and
/// trims the result.
pub fn sanitize_text_field(value: &str) -> String {
    let mut cleaned = value.to_string();

    if cleaned.contains('<') {
        cleaned = SCRIPT_STYLE_PATTERN.replace_all(&cleaned, "").into_owned();
        cleaned = TAG_PATTERN.replace_all(&cleaned, "").into_owned();
        cleaned = cleaned.replace('<', "&lt;");
    }

    // Removing one octet can expose another ("%%2020"), so repeat.
    while OCTET_PATTERN.is_match(&cleaned) {
        cleaned = OCTET_PATTERN.replace_all(&cleaned, "").into_owned();
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize submitted entries into an [`AbbreviationList`].
///
/// Every field is cleaned with [`sanitize_text_field`]. Entries whose
/// abbreviation or expansion ends up empty are skipped, as are repeats of
/// an abbreviation already accepted earlier in the list.
#[tracing::instrument(skip_all, fields(submitted = raw.len()))]
pub fn sanitize_entries(raw: &[RawEntry]) -> SanitizeReport {
    let mut entries = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();

    for (index, item) in raw.iter().enumerate() {
        let short = sanitize_text_field(item.short());
        let expansion = sanitize_text_field(item.expansion());
        let lang = sanitize_text_field(item.lang());

        let reason = if short.is_empty() {
            Some(SkipReason::EmptyShort)
        } else if expansion.is_empty() {
            Some(SkipReason::EmptyExpansion)
        } else if seen.contains(&short) {
            Some(SkipReason::Duplicate)
        } else {
            None
        };

        if let Some(reason) = reason {
            tracing::debug!(index, short = %short, %reason, "skipping abbreviation entry");
            skipped.push(SkippedEntry {
                index,
                short,
                reason,
            });
            continue;
        }

        seen.insert(short.clone());
        entries.push(AbbreviationEntry {
            short,
            expansion,
            lang,
        });
    }

    tracing::debug!(
        accepted = entries.len(),
        skipped = skipped.len(),
        "sanitized abbreviation entries"
    );

    SanitizeReport {
        entries: entries.into(),
        skipped,
    }
}
