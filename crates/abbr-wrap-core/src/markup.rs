//! Escaping and `<abbr>` tag rendering.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entry::AbbreviationEntry;

/// Class applied to annotations unless configured otherwise.
///
/// Syntax highlighters and code-formatting filters skip `nocode` elements.
pub const DEFAULT_CLASS: &str = "nocode";

/// Closing tag emitted after every annotated abbreviation.
pub const CLOSE_TAG: &str = "</abbr>";

/// A character reference at the start of the haystack (`&amp;`, `&#39;`, `&#x1F;`).
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").expect("valid regex")
});

/// Escape a value for use inside a double-quoted attribute.
///
/// Existing character references are kept as they are, so a sanitized
/// `&lt;` stays `&lt;` instead of turning into `&amp;lt;`.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value)
}

/// Escape a value for use as element text content.
pub fn escape_text(value: &str) -> Cow<'_, str> {
    escape(value)
}

fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 16);
    for (at, ch) in value.char_indices() {
        match ch {
            '&' if ENTITY_PATTERN.is_match(&value[at..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Presentation options for generated annotations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationStyle {
    /// Value of the `class` attribute; `None` omits it.
    pub class: Option<String>,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            class: Some(DEFAULT_CLASS.to_string()),
        }
    }
}

impl AnnotationStyle {
    /// Style with the given class. An empty string omits the attribute.
    pub fn with_class(class: impl Into<String>) -> Self {
        let class = class.into();
        Self {
            class: (!class.is_empty()).then_some(class),
        }
    }

    /// Style without a `class` attribute.
    pub const fn bare() -> Self {
        Self { class: None }
    }

    /// Render the opening tag for an entry.
    ///
    /// ```
    /// use abbr_wrap_core::{AbbreviationEntry, AnnotationStyle};
    ///
    /// let entry = AbbreviationEntry::new("RSVP", "Répondez s'il vous plaît", "fr");
    /// assert_eq!(
    ///     AnnotationStyle::default().open_tag(&entry),
    ///     r#"<abbr class="nocode" title="Répondez s&#039;il vous plaît" lang="fr">"#,
    /// );
    /// ```
    pub fn open_tag(&self, entry: &AbbreviationEntry) -> String {
        let mut tag = String::with_capacity(entry.expansion.len() + 48);
        tag.push_str("<abbr");
        if let Some(ref class) = self.class {
            tag.push_str(" class=\"");
            tag.push_str(&escape_attr(class));
            tag.push('"');
        }
        tag.push_str(" title=\"");
        tag.push_str(&escape_attr(&entry.expansion));
        tag.push('"');
        if let Some(lang) = entry.lang() {
            tag.push_str(" lang=\"");
            tag.push_str(&escape_attr(lang));
            tag.push('"');
        }
        tag.push('>');
        tag
    }

    /// Render the complete annotation for an entry.
    pub fn render(&self, entry: &AbbreviationEntry) -> String {
        format!(
            "{}{}{CLOSE_TAG}",
            self.open_tag(entry),
            escape_text(&entry.short)
        )
    }
}
