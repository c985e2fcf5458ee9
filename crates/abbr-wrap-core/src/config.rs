//! Configuration loading and discovery.
//!
//! Settings are merged from, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the user config (`config.<ext>` in the platform config dir)
//! 3. project files found by walking up from the search root
//! 4. files passed explicitly (`--config`)
//! 5. `ABBR_WRAP_*` environment variables
//!
//! Project files are named `.abbr.<ext>`, `abbr.<ext>`, `.abbr-wrap.<ext>` or
//! `abbr-wrap.<ext>` (that order, later wins), with `<ext>` one of `toml`,
//! `yaml`, `yml` or `json`. Only the closest directory holding any of them
//! contributes, and the walk stops at a directory containing `.git`.
//!
//! # Abbreviations
//!
//! The `abbreviations` key holds the list to annotate with. Each item is
//! either a `[short, expansion, lang]` array or a table:
//!
//! ```toml
//! class = "nocode"
//! abbreviations = [
//!     ["FYI", "For Your Information", ""],
//!     { short = "RSVP", expansion = "Répondez s'il vous plaît", lang = "fr" },
//! ]
//! ```
//!
//! A higher-precedence source replaces the whole list; lists from different
//! files are not concatenated.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use abbr_wrap_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("{} abbreviations", config.sanitized_abbreviations().entries.len());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::entry::RawEntry;
use crate::error::{ConfigError, ConfigResult};
use crate::markup::{AnnotationStyle, DEFAULT_CLASS};
use crate::sanitize::{SanitizeReport, sanitize_entries};

/// Default cap on input size (5 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Settings for abbr-wrap.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Minimum level for log output.
    pub log_level: LogLevel,
    /// Directory for JSONL log files; platform default when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Largest accepted input in bytes. Unset means 5 MiB.
    pub max_input_bytes: Option<usize>,
    /// Accept input of any size, ignoring `max_input_bytes`.
    pub disable_input_limit: bool,
    /// `class` attribute for generated annotations. Defaults to `nocode`;
    /// an empty string omits the attribute.
    pub class: Option<String>,
    /// Abbreviations to annotate, in priority order (first duplicate wins).
    pub abbreviations: Vec<RawEntry>,
}

impl Config {
    /// Effective input size limit, or `None` when disabled.
    pub fn max_input(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }

    /// Annotation style derived from `class`.
    pub fn annotation_style(&self) -> AnnotationStyle {
        match self.class {
            Some(ref class) => AnnotationStyle::with_class(class.as_str()),
            None => AnnotationStyle::default(),
        }
    }

    /// The `class` value annotations will carry, if any.
    pub fn effective_class(&self) -> Option<&str> {
        match self.class.as_deref() {
            Some("") => None,
            Some(class) => Some(class),
            None => Some(DEFAULT_CLASS),
        }
    }

    /// Sanitize the configured abbreviations.
    pub fn sanitized_abbreviations(&self) -> SanitizeReport {
        sanitize_entries(&self.abbreviations)
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-pass matcher details.
    Debug,
    /// Loaded configuration and annotation summaries (default).
    #[default]
    Info,
    /// Skipped entries and recoverable problems.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Lowercase name, as accepted in config files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which files went into a loaded [`Config`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Files from the closest project directory, lowest precedence first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// The user-level config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Files given with `--config`, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// The file that won, if any: last explicit, else closest project, else user.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .or_else(|| self.project_files.last())
            .map(Utf8PathBuf::as_path)
            .or(self.user_file.as_deref())
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

const APP_NAME: &str = "abbr-wrap";

/// Project file stems, lowest precedence first.
const APP_NAMES: &[&str] = &["abbr", "abbr-wrap"];

/// Builder that discovers and merges configuration sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    /// Directory entry that ends the upward walk (`.git` by default).
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Loader that reads the user config and stops discovery at `.git`.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for project files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include or skip the user-level config file.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward walk at a directory containing `marker`.
    ///
    /// The directory holding the marker is still searched.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Walk all the way to the filesystem root.
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Merge `path` after every discovered file. Later calls win.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source and deserialize the result.
    ///
    /// See the module docs for precedence.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            sources.project_files = self.find_project_configs(root);
            for path in &sources.project_files {
                figment = Self::merge_file(figment, path);
            }
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        // ABBR_WRAP_CLASS=term, ABBR_WRAP_LOG_LEVEL=debug, etc.
        figment = figment.merge(Env::prefixed("ABBR_WRAP_").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            abbreviations = config.abbreviations.len(),
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Like [`load`](Self::load), but fails with [`ConfigError::NotFound`]
    /// when no file at all would be read.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && self.find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());

        if !has_user && !has_project && self.explicit_files.is_empty() {
            return Err(ConfigError::NotFound);
        }

        self.load()
    }

    /// Project files from the closest directory (at or above `start`) that has any.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        for dir in start.ancestors() {
            let found = project_files_in(dir);
            if !found.is_empty() {
                return found;
            }

            // Checked after the config files so a config next to the marker is found.
            if let Some(ref marker) = self.boundary_marker
                && dir != start
                && dir.join(marker).exists()
            {
                break;
            }
        }

        Vec::new()
    }

    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;

        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Unknown extensions are read as TOML.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Existing project files in `dir`, lowest precedence first: `abbr` stems
/// before `abbr-wrap`, dotfiles before plain names, then by extension.
fn project_files_in(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    APP_NAMES
        .iter()
        .flat_map(|name| [format!(".{name}"), (*name).to_string()])
        .flat_map(|stem| {
            CONFIG_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{stem}.{ext}")))
        })
        .filter(|path| path.is_file())
        .collect()
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Platform config directory for abbr-wrap (`~/.config/abbr-wrap` on Linux).
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

/// Default log directory (machine-local data dir + `logs`).
pub fn user_log_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.data_local_dir().join("logs")).ok()
}
