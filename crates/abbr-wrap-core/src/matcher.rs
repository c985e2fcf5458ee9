//! Abbreviation matching and annotation.
//!
//! All abbreviations are compiled into one Aho-Corasick automaton and the
//! text is searched once. Every occurrence the automaton reports is then
//! checked against the word-boundary rules:
//!
//! - **left**: start of text, a whitespace character, or `>` (right after a
//!   tag closes, unless that tag is itself an `<abbr>` or `</abbr>`)
//! - **right**: end of text, a whitespace character, or one of
//!   `. , : ; ! ? < >` (but never the start of a `</abbr>` tag)
//!
//! Boundaries are looked at, not consumed, so neighbouring abbreviations
//! separated by a single space both qualify. When several abbreviations
//! start at the same position the longest qualifying one wins. Each
//! abbreviation is wrapped at its first qualifying occurrence only.
//!
//! Existing `<abbr>` elements in the input are left untouched, and an
//! element wrapping exactly a known abbreviation counts as that
//! abbreviation's annotation. Running the annotator over its own output
//! therefore changes nothing.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use aho_corasick::{AhoCorasick, Match, MatchKind};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entry::AbbreviationEntry;
use crate::markup::{AnnotationStyle, CLOSE_TAG, escape_text};

/// Existing `<abbr>` elements; group 1 is the element's content.
static ABBR_ELEMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<abbr(?:\s[^>]*)?>(.*?)</abbr\s*>").expect("valid regex"));

/// Punctuation that may directly follow an abbreviation.
const RIGHT_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', '<', '>'];

/// Annotated text together with the abbreviations that were wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Annotated {
    /// The annotated text.
    pub text: String,
    /// Abbreviations wrapped in this pass, in order of appearance.
    pub annotated: Vec<String>,
}

/// A set of abbreviations compiled for repeated matching.
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    /// Accepted entries, longest abbreviation first; index = pattern id.
    entries: Vec<AbbreviationEntry>,
    /// `None` when there is nothing to match.
    automaton: Option<AhoCorasick>,
    /// Element content → pattern ids it counts as an annotation for.
    ///
    /// Keyed by the escaped form the matcher emits; raw forms are only
    /// added where no escaped form claims the same text.
    by_content: HashMap<String, Vec<usize>>,
    /// Byte length of the longest abbreviation.
    max_len: usize,
    style: AnnotationStyle,
}

impl CompiledMatcher {
    /// Compile entries with the default annotation style.
    pub fn new(entries: &[AbbreviationEntry]) -> Self {
        Self::with_style(entries, AnnotationStyle::default())
    }

    /// Compile entries with a specific annotation style.
    ///
    /// Entries with an empty abbreviation or expansion are skipped, as is
    /// any repeat of an abbreviation already seen (first wins).
    #[tracing::instrument(skip_all, fields(entries = entries.len()))]
    pub fn with_style(entries: &[AbbreviationEntry], style: AnnotationStyle) -> Self {
        let mut seen = HashSet::new();
        let mut accepted: Vec<AbbreviationEntry> = Vec::with_capacity(entries.len());

        for entry in entries {
            if !entry.is_well_formed() {
                tracing::debug!(short = %entry.short, "skipping malformed abbreviation");
                continue;
            }
            if !seen.insert(entry.short.as_str()) {
                tracing::debug!(short = %entry.short, "skipping duplicate abbreviation");
                continue;
            }
            accepted.push(entry.clone());
        }

        // Stable: equal lengths keep their list order.
        accepted.sort_by_key(|entry| Reverse(entry.short.chars().count()));

        let automaton = if accepted.is_empty() {
            None
        } else {
            match AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .build(accepted.iter().map(|entry| entry.short.as_str()))
            {
                Ok(automaton) => Some(automaton),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to build abbreviation automaton");
                    None
                }
            }
        };

        // `R&D` and `R&amp;D` both render as `R&amp;D`, so one element can
        // stand for several entries.
        let mut by_content: HashMap<String, Vec<usize>> =
            HashMap::with_capacity(accepted.len() * 2);
        for (id, entry) in accepted.iter().enumerate() {
            by_content
                .entry(escape_text(&entry.short).into_owned())
                .or_default()
                .push(id);
        }
        for (id, entry) in accepted.iter().enumerate() {
            by_content
                .entry(entry.short.clone())
                .or_insert_with(|| vec![id]);
        }

        let max_len = accepted.iter().map(|entry| entry.short.len()).max().unwrap_or(0);

        tracing::debug!(patterns = accepted.len(), "compiled abbreviation matcher");

        Self {
            entries: accepted,
            automaton,
            by_content,
            max_len,
            style,
        }
    }

    /// Accepted entries, longest abbreviation first.
    pub fn entries(&self) -> &[AbbreviationEntry] {
        &self.entries
    }

    /// Number of abbreviations the matcher looks for.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the matcher has nothing to look for.
    pub fn is_empty(&self) -> bool {
        self.automaton.is_none()
    }

    /// The style used to render annotations.
    pub const fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Annotate `text`, returning only the resulting text.
    pub fn annotate(&self, text: &str) -> String {
        self.annotate_with_report(text).text
    }

    /// Annotate `text` and report which abbreviations were wrapped.
    #[tracing::instrument(skip_all, fields(text_len = text.len(), patterns = self.entries.len()))]
    pub fn annotate_with_report(&self, text: &str) -> Annotated {
        let automaton = match self.automaton {
            Some(ref automaton) if !text.is_empty() => automaton,
            _ => {
                return Annotated {
                    text: text.to_string(),
                    annotated: Vec::new(),
                };
            }
        };

        let candidates = LongestPerStart::new(
            automaton
                .find_overlapping_iter(text)
                .filter(|m| has_left_boundary(text, m.start()) && has_right_boundary(text, m.end())),
            self.max_len,
        );
        let mut existing = existing_annotations(text).peekable();

        let mut consumed = Consumed::new(self.entries.len());
        let mut annotated = Vec::new();
        let mut out = String::with_capacity(text.len() + 64);
        let mut emitted = 0;
        let mut cursor = 0;

        for m in candidates {
            if consumed.all() {
                break;
            }
            if m.start() < cursor {
                continue;
            }

            // Existing annotations that begin before this candidate count
            // as already wrapped and are never entered.
            while let Some(span) = existing.next_if(|span| span.outer.start <= m.start()) {
                for &id in self.by_content.get(&text[span.content.clone()]).into_iter().flatten() {
                    consumed.mark(id);
                }
                cursor = cursor.max(span.outer.end);
            }
            if m.start() < cursor {
                continue;
            }

            let id = m.pattern().as_usize();
            cursor = m.end();
            if !consumed.mark(id) {
                continue;
            }

            let entry = &self.entries[id];
            out.push_str(&text[emitted..m.start()]);
            out.push_str(&self.style.open_tag(entry));
            out.push_str(&escape_text(&text[m.range()]));
            out.push_str(CLOSE_TAG);
            emitted = m.end();
            annotated.push(entry.short.clone());
        }

        out.push_str(&text[emitted..]);

        tracing::debug!(annotated = annotated.len(), "annotation pass complete");
        Annotated {
            text: out,
            annotated,
        }
    }
}

/// Annotate `text` with the default style.
///
/// Returns the input unchanged, without compiling anything, when either the
/// text or the entry list is empty.
///
/// ```
/// use abbr_wrap_core::{AbbreviationEntry, annotate};
///
/// let entries = [AbbreviationEntry::new("FYI", "For Your Information", "")];
/// assert_eq!(
///     annotate("Just FYI, this is a test.", &entries),
///     r#"Just <abbr class="nocode" title="For Your Information">FYI</abbr>, this is a test."#,
/// );
/// ```
pub fn annotate(text: &str, entries: &[AbbreviationEntry]) -> String {
    annotate_with_style(text, entries, &AnnotationStyle::default())
}

/// Annotate `text` with an explicit style.
pub fn annotate_with_style(
    text: &str,
    entries: &[AbbreviationEntry],
    style: &AnnotationStyle,
) -> String {
    if text.is_empty() || entries.is_empty() {
        return text.to_string();
    }
    CompiledMatcher::with_style(entries, style.clone()).annotate(text)
}

/// Overlapping matches reduced to the longest one per start offset, in
/// start order.
///
/// The automaton reports overlapping matches by end offset. A match is at
/// most `max_len` bytes long, so once a match ending past `start + max_len`
/// arrives nothing else can start at or before `start`, and the pending
/// window never holds more than `max_len` starts.
struct LongestPerStart<I> {
    matches: I,
    pending: BTreeMap<usize, Match>,
    max_len: usize,
    last_end: usize,
    exhausted: bool,
}

impl<I: Iterator<Item = Match>> LongestPerStart<I> {
    fn new(matches: I, max_len: usize) -> Self {
        Self {
            matches,
            pending: BTreeMap::new(),
            max_len,
            last_end: 0,
            exhausted: false,
        }
    }
}

impl<I: Iterator<Item = Match>> Iterator for LongestPerStart<I> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if let Some(first) = self.pending.first_entry()
                && (self.exhausted || first.key() + self.max_len < self.last_end)
            {
                return Some(first.remove());
            }
            if self.exhausted {
                return None;
            }

            match self.matches.next() {
                Some(m) => {
                    self.last_end = m.end();
                    self.pending
                        .entry(m.start())
                        .and_modify(|best| {
                            if m.end() > best.end() {
                                *best = m;
                            }
                        })
                        .or_insert(m);
                }
                None => self.exhausted = true,
            }
        }
    }
}

/// Which abbreviations are already annotated during one pass.
struct Consumed {
    flags: Vec<bool>,
    remaining: usize,
}

impl Consumed {
    fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
            remaining: len,
        }
    }

    /// Mark `id`; `false` if it was already marked.
    fn mark(&mut self, id: usize) -> bool {
        if self.flags[id] {
            return false;
        }
        self.flags[id] = true;
        self.remaining -= 1;
        true
    }

    fn all(&self) -> bool {
        self.remaining == 0
    }
}

/// An `<abbr>` element already present in the input.
#[derive(Debug)]
struct ExistingAnnotation {
    outer: Range<usize>,
    content: Range<usize>,
}

fn existing_annotations(text: &str) -> impl Iterator<Item = ExistingAnnotation> + '_ {
    ABBR_ELEMENT_PATTERN.captures_iter(text).filter_map(|caps| {
        let outer = caps.get(0)?.range();
        let content = caps.get(1)?.range();
        Some(ExistingAnnotation { outer, content })
    })
}

fn has_left_boundary(text: &str, start: usize) -> bool {
    match text[..start].chars().next_back() {
        None => true,
        Some(ch) if ch.is_whitespace() => true,
        Some('>') => !closes_abbr_tag(&text[..start]),
        Some(_) => false,
    }
}

fn has_right_boundary(text: &str, end: usize) -> bool {
    let rest = &text[end..];
    match rest.chars().next() {
        None => true,
        Some(ch) if ch.is_whitespace() => true,
        Some('<') => !starts_with_ignore_case(rest, "</abbr"),
        Some(ch) => RIGHT_PUNCTUATION.contains(&ch),
    }
}

/// Whether `before` (ending in `>`) ends with an `<abbr ...>` or `</abbr>` tag.
fn closes_abbr_tag(before: &str) -> bool {
    let Some(open) = before.rfind('<') else {
        return false;
    };
    let tag = &before[open + 1..];
    let name = tag.strip_prefix('/').unwrap_or(tag);
    starts_with_ignore_case(name, "abbr")
        && name[4..]
            .chars()
            .next()
            .is_some_and(|ch| ch == '>' || ch.is_whitespace())
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
