//! Annotate command: wrap known abbreviations in a file or stdin.

use std::io::Write;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, info, instrument, warn};

use abbr_wrap_core::{AnnotationStyle, CompiledMatcher, Config, RawEntry, sanitize_entries};

/// Arguments for the `annotate` subcommand.
#[derive(Args, Debug, Default)]
pub struct AnnotateArgs {
    /// File to annotate (reads stdin when omitted or `-`).
    pub file: Option<Utf8PathBuf>,

    /// Write the result to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE", conflicts_with = "in_place")]
    pub output: Option<Utf8PathBuf>,

    /// Overwrite the input file with the result.
    #[arg(long)]
    pub in_place: bool,

    /// `class` attribute for generated tags (empty string omits it).
    #[arg(long, value_name = "CLASS")]
    pub class: Option<String>,

    /// Extra abbreviation, appended after configured ones (repeatable).
    #[arg(long, value_name = "SHORT=EXPANSION[@LANG]", value_parser = parse_abbr)]
    pub abbr: Vec<RawEntry>,
}

/// Parse `SHORT=EXPANSION` or `SHORT=EXPANSION@LANG`.
///
/// The language suffix is only recognized when it contains no whitespace, so
/// expansions like `Meet @ noon` keep their `@`.
pub fn parse_abbr(value: &str) -> Result<RawEntry, String> {
    let (short, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SHORT=EXPANSION[@LANG], got `{value}`"))?;

    let (expansion, lang) = match rest.rsplit_once('@') {
        Some((expansion, lang))
            if !lang.is_empty() && !lang.contains(char::is_whitespace) =>
        {
            (expansion, lang)
        }
        _ => (rest, ""),
    };

    if short.trim().is_empty() {
        return Err(format!("abbreviation is empty in `{value}`"));
    }
    if expansion.trim().is_empty() {
        return Err(format!("expansion is empty in `{value}`"));
    }

    Ok(RawEntry::Tuple(vec![
        short.to_string(),
        expansion.to_string(),
        lang.to_string(),
    ]))
}

/// Where the annotated text goes.
#[derive(Clone, Copy)]
enum Destination<'a> {
    Stdout,
    File(&'a Utf8Path),
}

/// Annotate a file (or stdin) with configured and inline abbreviations.
#[instrument(name = "cmd_annotate", skip_all, fields(file = ?args.file))]
pub fn cmd_annotate(
    args: AnnotateArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    debug!(
        extra = args.abbr.len(),
        in_place = args.in_place,
        "executing annotate command"
    );

    let source = args.file.as_deref().filter(|path| path.as_str() != "-");
    if args.in_place && source.is_none() {
        bail!("--in-place requires an input file");
    }

    let input = match source {
        Some(path) => super::read_input_file(path, max_input)?,
        None => super::read_stdin(max_input)?,
    };

    let mut raw = config.abbreviations.clone();
    raw.extend(args.abbr);
    let report = sanitize_entries(&raw);
    for skipped in &report.skipped {
        warn!(
            index = skipped.index,
            short = %skipped.short,
            reason = %skipped.reason,
            "ignoring abbreviation"
        );
    }

    let style = args
        .class
        .map_or_else(|| config.annotation_style(), AnnotationStyle::with_class);
    let matcher = CompiledMatcher::with_style(report.entries.entries(), style);
    let result = matcher.annotate_with_report(&input);
    info!(
        abbreviations = matcher.len(),
        annotated = result.annotated.len(),
        "annotation complete"
    );

    let destination = match (args.in_place, args.output.as_deref(), source) {
        (true, _, Some(path)) => Destination::File(path),
        (_, Some(path), _) => Destination::File(path),
        _ => Destination::Stdout,
    };

    if let Destination::File(path) = destination {
        std::fs::write(path.as_std_path(), &result.text)
            .with_context(|| format!("failed to write {path}"))?;
    }

    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match destination {
        Destination::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(result.text.as_bytes())
                .context("failed to write to stdout")?;
            stdout.flush().context("failed to write to stdout")?;
        }
        Destination::File(path) => {
            let count = result.annotated.len();
            let noun = if count == 1 { "abbreviation" } else { "abbreviations" };
            println!("{} {count} {noun} in {}", "Annotated".green(), path.cyan());
        }
    }

    Ok(())
}
