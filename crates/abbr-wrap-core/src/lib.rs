//! Core library for abbr-wrap.
//!
//! Wraps known abbreviations in text with `<abbr>` markup carrying their
//! expansion as a `title` and, optionally, a `lang` attribute. Used by the
//! `abbr-wrap` CLI and MCP server, and by any downstream renderer.
//!
//! # Modules
//!
//! - [`entry`] - Abbreviation entries and the stored (raw) shape
//! - [`sanitize`] - Cleanup and validation of submitted entries
//! - [`markup`] - Escaping and `<abbr>` rendering
//! - [`matcher`] - Boundary-aware, longest-first, first-occurrence annotation
//! - [`cache`] - Memoized matchers for long-running hosts
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use abbr_wrap_core::{AbbreviationEntry, annotate};
//!
//! let entries = [
//!     AbbreviationEntry::new("USA", "United States of America", "en"),
//!     AbbreviationEntry::new("US", "United States", "en"),
//! ];
//!
//! let html = annotate("Made in the USA.", &entries);
//! assert_eq!(
//!     html,
//!     r#"Made in the <abbr class="nocode" title="United States of America" lang="en">USA</abbr>."#
//! );
//! ```
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod markup;
pub mod matcher;
pub mod sanitize;

pub use cache::{EntrySource, MatcherCache, StaticSource};
pub use config::{Config, ConfigLoader, ConfigSources, DEFAULT_MAX_INPUT_BYTES, LogLevel};
pub use entry::{AbbreviationEntry, AbbreviationList, RawEntry};
pub use error::{ConfigError, ConfigResult, SkipReason};
pub use markup::{AnnotationStyle, DEFAULT_CLASS};
pub use matcher::{Annotated, CompiledMatcher, annotate, annotate_with_style};
pub use sanitize::{SanitizeReport, SkippedEntry, sanitize_entries, sanitize_text_field};
