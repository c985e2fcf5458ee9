//! Memoization of compiled matchers.
//!
//! Compiling a matcher is cheap but not free, and a long-running host (the
//! MCP server, a rendering service) annotates many texts against the same
//! list. [`MatcherCache`] keeps the most recent compilation keyed on the
//! exact list content and hands out shared snapshots, so a caller that is
//! mid-annotation never observes a half-updated list.

use std::sync::{Arc, PoisonError, RwLock};

use crate::entry::{AbbreviationEntry, AbbreviationList};
use crate::markup::AnnotationStyle;
use crate::matcher::{Annotated, CompiledMatcher};

/// Supplier of the current abbreviation list.
///
/// Implementations decide where entries live (config file, database,
/// request parameters). `get` returns `None` when no list is available,
/// which annotators treat the same as an empty list.
pub trait EntrySource: Send + Sync {
    /// Fetch the current list.
    fn get(&self) -> Option<AbbreviationList>;

    /// Human-readable name of this source (for logging).
    fn name(&self) -> &str;
}

/// A fixed, in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: AbbreviationList,
}

impl StaticSource {
    /// Wrap a list.
    pub const fn new(entries: AbbreviationList) -> Self {
        Self { entries }
    }
}

impl EntrySource for StaticSource {
    fn get(&self) -> Option<AbbreviationList> {
        Some(self.entries.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[derive(Debug)]
struct Slot {
    entries: Vec<AbbreviationEntry>,
    matcher: Arc<CompiledMatcher>,
}

/// Thread-safe single-slot cache of the last compiled matcher.
#[derive(Debug, Default)]
pub struct MatcherCache {
    style: AnnotationStyle,
    slot: RwLock<Option<Slot>>,
}

impl MatcherCache {
    /// Create an empty cache producing matchers with `style`.
    pub fn new(style: AnnotationStyle) -> Self {
        Self {
            style,
            slot: RwLock::new(None),
        }
    }

    /// The style every cached matcher renders with.
    pub const fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Return a matcher for `entries`, compiling only when the list differs
    /// from the one cached.
    pub fn matcher_for(&self, entries: &[AbbreviationEntry]) -> Arc<CompiledMatcher> {
        {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *slot
                && cached.entries == entries
            {
                tracing::trace!("matcher cache hit");
                return Arc::clone(&cached.matcher);
            }
        }

        tracing::debug!(entries = entries.len(), "matcher cache miss, compiling");
        let matcher = Arc::new(CompiledMatcher::with_style(entries, self.style.clone()));
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Slot {
            entries: entries.to_vec(),
            matcher: Arc::clone(&matcher),
        });
        matcher
    }

    /// Annotate `text` with whatever list `source` currently supplies.
    #[tracing::instrument(skip_all, fields(source = source.name(), text_len = text.len()))]
    pub fn annotate(&self, text: &str, source: &dyn EntrySource) -> Annotated {
        let entries = source.get().unwrap_or_default();
        if entries.is_empty() || text.is_empty() {
            return Annotated {
                text: text.to_string(),
                annotated: Vec::new(),
            };
        }
        self.matcher_for(entries.entries()).annotate_with_report(text)
    }

    /// Drop the cached matcher. Call whenever the underlying list changes.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            tracing::debug!("matcher cache invalidated");
        }
    }

    /// Whether a compiled matcher is currently held.
    pub fn is_warm(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
