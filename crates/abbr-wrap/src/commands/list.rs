//! List command: show the configured abbreviations after sanitization.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use abbr_wrap_core::{Config, SanitizeReport};

/// Arguments for the `list` subcommand.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Exit with an error when any configured entry was dropped.
    #[arg(long)]
    pub strict: bool,
}

/// Print the sanitized abbreviation list and any skipped entries.
#[instrument(name = "cmd_list", skip_all, fields(strict = args.strict))]
pub fn cmd_list(args: ListArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let report = config.sanitized_abbreviations();
    debug!(
        accepted = report.entries.len(),
        skipped = report.skipped.len(),
        "executing list command"
    );

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if args.strict && !report.skipped.is_empty() {
        anyhow::bail!(
            "{} configured abbreviation(s) were dropped",
            report.skipped.len()
        );
    }

    Ok(())
}

fn print_report(report: &SanitizeReport) {
    if report.entries.is_empty() {
        println!("{}", "No abbreviations configured.".yellow());
    }

    let width = report
        .entries
        .iter()
        .map(|entry| entry.short.chars().count())
        .max()
        .unwrap_or(0);

    for entry in &report.entries {
        let pad = width - entry.short.chars().count();
        match entry.lang() {
            Some(lang) => println!(
                "{}{:pad$}  {} {}",
                entry.short.bold(),
                "",
                entry.expansion,
                format!("[{lang}]").dimmed()
            ),
            None => println!("{}{:pad$}  {}", entry.short.bold(), "", entry.expansion),
        }
    }

    for skipped in &report.skipped {
        let short = if skipped.short.is_empty() {
            "(empty)"
        } else {
            skipped.short.as_str()
        };
        eprintln!(
            "{} entry {} ({short}): {}",
            "skipped:".yellow(),
            skipped.index,
            skipped.reason
        );
    }
}
