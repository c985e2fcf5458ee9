//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes the annotator over the MCP protocol so AI assistants and
//! rendering pipelines can wrap abbreviations via stdio transport.
//!
//! # Architecture
//!
//! The MCP server is a presentation layer. It wraps the same core library
//! that the CLI commands use; each `#[tool]` method delegates to
//! `abbr_wrap_core` rather than implementing matching itself. The configured
//! list is sanitized once at startup and its compiled matcher is memoized in
//! a [`MatcherCache`], so repeated `annotate_text` calls reuse one automaton.
//!
//! # Tools
//!
//! - `get_info` - package name, version, and abbreviation count
//! - `annotate_text` - wrap abbreviations in a text
//! - `list_abbreviations` - the configured list after sanitization

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use abbr_wrap_core::{
    Annotated, AnnotationStyle, CompiledMatcher, Config, DEFAULT_MAX_INPUT_BYTES, MatcherCache,
    RawEntry, SanitizeReport, SkippedEntry, StaticSource, sanitize_entries,
};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `annotate_text` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AnnotateTextParams {
    /// The text (usually HTML) to annotate.
    pub text: String,
    /// Abbreviations to use instead of the configured list. Each item is
    /// `[short, expansion, lang]` or `{short, expansion, lang?}`.
    pub abbreviations: Option<Vec<RawEntry>>,
    /// `class` attribute for generated tags; empty string omits it.
    pub class: Option<String>,
}

/// Result of the `annotate_text` tool.
#[derive(Debug, Serialize)]
struct AnnotateTextResponse {
    #[serde(flatten)]
    result: Annotated,
    /// Entries from the `abbreviations` parameter that were dropped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedEntry>,
}

/// MCP server exposing the annotator to AI assistants.
///
/// Each `#[tool]` method in the `#[tool_router]` impl block is automatically
/// registered and callable via the MCP protocol.
#[derive(Clone)]
pub struct ProjectServer {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    configured: Arc<SanitizeReport>,
    source: Arc<StaticSource>,
    cache: Arc<MatcherCache>,
    max_input: Option<usize>,
}

impl Default for ProjectServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl ProjectServer {
    /// Create a server with no configured abbreviations and the default input limit.
    pub fn new() -> Self {
        Self::with_config(&Config::default(), Some(DEFAULT_MAX_INPUT_BYTES))
    }

    /// Create a server for a loaded configuration.
    pub fn with_config(config: &Config, max_input: Option<usize>) -> Self {
        let configured = config.sanitized_abbreviations();
        for skipped in &configured.skipped {
            tracing::warn!(
                index = skipped.index,
                short = %skipped.short,
                reason = %skipped.reason,
                "ignoring configured abbreviation"
            );
        }
        let source = StaticSource::new(configured.entries.clone());

        Self {
            tool_router: Self::tool_router(),
            configured: Arc::new(configured),
            source: Arc::new(source),
            cache: Arc::new(MatcherCache::new(config.annotation_style())),
            max_input,
        }
    }

    fn check_input_size(&self, text: &str) -> Result<(), McpError> {
        if let Some(max) = self.max_input
            && text.len() > max
        {
            return Err(McpError::invalid_params(
                format!("input too large: {} bytes (limit: {max} bytes)", text.len()),
                None,
            ));
        }
        Ok(())
    }

    /// Get project information.
    #[tool(description = "Get project name, version, description, and abbreviation count")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let abbreviations = self.configured.entries.len();
        let text = if params.format == "json" {
            let info = serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "description": env!("CARGO_PKG_DESCRIPTION"),
                "abbreviations": abbreviations,
            });
            serde_json::to_string_pretty(&info)
                .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?
        } else {
            format!(
                "{} v{}\n{}\n{abbreviations} abbreviations configured",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Wrap known abbreviations in `<abbr>` markup.
    #[tool(
        description = "Wrap abbreviations in <abbr> markup with their expansion as title. Each abbreviation is wrapped once, at its first whole-word occurrence; existing <abbr> elements are left alone. Uses the configured list unless `abbreviations` is given. Returns JSON with the annotated text and the abbreviations that were wrapped."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", text_len = params.text.len()))]
    fn annotate_text(
        &self,
        Parameters(params): Parameters<AnnotateTextParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "annotate_text",
            inline = params.abbreviations.is_some(),
            class = ?params.class,
            "executing MCP tool"
        );
        self.check_input_size(&params.text)?;

        let style = params.class.map(AnnotationStyle::with_class);
        let response = match (params.abbreviations, style) {
            (Some(raw), style) => {
                let report = sanitize_entries(&raw);
                let style = style.unwrap_or_else(|| self.cache.style().clone());
                let matcher = CompiledMatcher::with_style(report.entries.entries(), style);
                AnnotateTextResponse {
                    result: matcher.annotate_with_report(&params.text),
                    skipped: report.skipped,
                }
            }
            (None, Some(style)) if &style != self.cache.style() => {
                let matcher =
                    CompiledMatcher::with_style(self.configured.entries.entries(), style);
                AnnotateTextResponse {
                    result: matcher.annotate_with_report(&params.text),
                    skipped: Vec::new(),
                }
            }
            (None, _) => AnnotateTextResponse {
                result: self.cache.annotate(&params.text, self.source.as_ref()),
                skipped: Vec::new(),
            },
        };

        let json = serde_json::to_string_pretty(&response)
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "annotate_text",
            annotated = response.result.annotated.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// List the configured abbreviations.
    #[tool(
        description = "List the configured abbreviations (short, expansion, lang) and any entries dropped during sanitization."
    )]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn list_abbreviations(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_abbreviations", "executing MCP tool");

        let json = serde_json::to_string_pretty(self.configured.as_ref())
            .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))?;

        tracing::info!(
            tool = "list_abbreviations",
            count = self.configured.entries.len(),
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for ProjectServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Use annotate_text to wrap abbreviations in <abbr> markup.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;

    fn configured_server() -> ProjectServer {
        let config = Config {
            abbreviations: vec![
                RawEntry::Tuple(vec!["FYI".into(), "For Your Information".into(), "".into()]),
                RawEntry::Tuple(vec!["USA".into(), "United States of America".into(), "en".into()]),
                RawEntry::Tuple(vec!["US".into(), "United States".into(), "en".into()]),
            ],
            ..Config::default()
        };
        ProjectServer::with_config(&config, Some(1024))
    }

    /// Extract text from the first content item in a `CallToolResult`.
    fn extract_text(result: &CallToolResult) -> Option<&str> {
        result.content.first().and_then(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }

    fn annotate(server: &ProjectServer, params: AnnotateTextParams) -> serde_json::Value {
        let result = server
            .annotate_text(Parameters(params))
            .expect("annotate_text should succeed");
        assert!(!result.is_error.unwrap_or(false));
        let text = extract_text(&result).expect("should have text content");
        serde_json::from_str(text).expect("valid JSON")
    }

    #[test]
    fn server_info_has_correct_name() {
        let server = ProjectServer::new();
        let info = ServerHandler::get_info(&server);

        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn server_has_tools_capability() {
        let server = ProjectServer::new();
        let info = ServerHandler::get_info(&server);

        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn server_has_instructions() {
        let server = ProjectServer::new();
        let info = ServerHandler::get_info(&server);

        let instructions = info.instructions.expect("server should have instructions");
        assert!(instructions.contains(env!("CARGO_PKG_NAME")));
    }

    #[test]
    fn get_info_tool_returns_text_by_default() {
        let server = ProjectServer::new();
        let params = Parameters(GetInfoParams {
            format: "text".to_string(),
        });

        let result = server.get_info(params).expect("get_info should succeed");

        assert!(!result.is_error.unwrap_or(false));
        let text = extract_text(&result).expect("should have text content");
        assert!(text.contains(env!("CARGO_PKG_NAME")));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn get_info_tool_returns_json_when_requested() {
        let server = configured_server();
        let params = Parameters(GetInfoParams {
            format: "json".to_string(),
        });

        let result = server.get_info(params).expect("get_info should succeed");
        let text = extract_text(&result).expect("should have text content");
        let json: serde_json::Value =
            serde_json::from_str(text).expect("output should be valid JSON");

        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["abbreviations"], 3);
    }

    #[test]
    fn annotate_text_uses_configured_list() {
        let server = configured_server();
        let json = annotate(
            &server,
            AnnotateTextParams {
                text: "FYI, the USA and the US.".to_string(),
                abbreviations: None,
                class: None,
            },
        );

        assert_eq!(
            json["text"],
            r#"<abbr class="nocode" title="For Your Information">FYI</abbr>, the <abbr class="nocode" title="United States of America" lang="en">USA</abbr> and the <abbr class="nocode" title="United States" lang="en">US</abbr>."#
        );
        assert_eq!(json["annotated"], serde_json::json!(["FYI", "USA", "US"]));
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn annotate_text_reuses_cached_matcher() {
        let server = configured_server();
        let params = || AnnotateTextParams {
            text: "FYI".to_string(),
            abbreviations: None,
            class: None,
        };

        annotate(&server, params());
        assert!(server.cache.is_warm());
        let first = server.cache.matcher_for(server.configured.entries.entries());
        annotate(&server, params());
        let second = server.cache.matcher_for(server.configured.entries.entries());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn annotate_text_with_inline_list_reports_skipped() {
        let server = configured_server();
        let json = annotate(
            &server,
            AnnotateTextParams {
                text: "Please RSVP by Friday.".to_string(),
                abbreviations: Some(vec![
                    RawEntry::Table {
                        short: "RSVP".to_string(),
                        expansion: "Répondez s'il vous plaît".to_string(),
                        lang: Some("fr".to_string()),
                    },
                    RawEntry::Tuple(vec!["RSVP".into(), "Duplicate".into()]),
                ]),
                class: Some(String::new()),
            },
        );

        assert_eq!(
            json["text"],
            r#"Please <abbr title="Répondez s&#039;il vous plaît" lang="fr">RSVP</abbr> by Friday."#
        );
        assert_eq!(json["skipped"][0]["reason"], "duplicate");
    }

    #[test]
    fn annotate_text_custom_class_with_configured_list() {
        let server = configured_server();
        let json = annotate(
            &server,
            AnnotateTextParams {
                text: "FYI".to_string(),
                abbreviations: None,
                class: Some("term".to_string()),
            },
        );

        assert_eq!(
            json["text"],
            r#"<abbr class="term" title="For Your Information">FYI</abbr>"#
        );
    }

    #[test]
    fn annotate_text_is_idempotent() {
        let server = configured_server();
        let first = annotate(
            &server,
            AnnotateTextParams {
                text: "Just FYI.".to_string(),
                abbreviations: None,
                class: None,
            },
        );
        let again = annotate(
            &server,
            AnnotateTextParams {
                text: first["text"].as_str().unwrap().to_string(),
                abbreviations: None,
                class: None,
            },
        );

        assert_eq!(first["text"], again["text"]);
        assert_eq!(again["annotated"], serde_json::json!([]));
    }

    #[test]
    fn annotate_text_rejects_oversized_input() {
        let server = configured_server();
        let err = server
            .annotate_text(Parameters(AnnotateTextParams {
                text: "x".repeat(2048),
                abbreviations: None,
                class: None,
            }))
            .unwrap_err();

        assert!(err.message.contains("input too large"));
    }

    #[test]
    fn list_abbreviations_returns_configured_entries() {
        let server = configured_server();
        let result = server
            .list_abbreviations()
            .expect("list_abbreviations should succeed");
        let text = extract_text(&result).expect("should have text content");
        let json: serde_json::Value = serde_json::from_str(text).expect("valid JSON");

        assert_eq!(json["entries"].as_array().unwrap().len(), 3);
        assert_eq!(json["entries"][1]["short"], "USA");
        assert_eq!(json["entries"][1]["lang"], "en");
    }
}
