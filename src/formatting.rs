use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use figmint_lib::paths::WriteOutcome;
use figmint_lib::{FigmintError, FigmintOutput, VersionBump};

use crate::cli::OutputFormat;

/// Write output in the requested format to stdout.
pub fn write_output(body: &FigmintOutput, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json_output(body),
        OutputFormat::Pretty => write_pretty_output(body),
    }
}

/// Render an error and return the fatal exit code.
pub fn render_error(err: FigmintError, format: OutputFormat) -> ExitCode {
    let payload = FigmintOutput::error(err.to_payload());
    if let Err(write_err) = write_output(&payload, format) {
        eprintln!("Failed to write error output: {}", write_err);
    }
    ExitCode::from(2)
}

fn write_json_output(body: &FigmintOutput) -> io::Result<()> {
    let content = serde_json::to_string(body).map_err(io::Error::other)?;
    println!("{content}");
    Ok(())
}

fn write_pretty_output(body: &FigmintOutput) -> io::Result<()> {
    if io::stdout().is_terminal() {
        println!("{}", format_pretty(body, true));
        return Ok(());
    }

    // Non-tty: keep JSON shape for pipelines.
    let content = serde_json::to_string_pretty(body).map_err(io::Error::other)?;
    println!("{content}");
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &FigmintOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        FigmintOutput::Sync(out) => {
            let report = &out.report;
            let header = color("[SYNC]", "32", colorize);
            let run = out.run.map(|n| format!(" (run {n})")).unwrap_or_default();
            writeln!(buf, "{header} {}{run}", report.document_name).ok();
            writeln!(buf, "Output: {}", report.output.display()).ok();
            writeln!(
                buf,
                "Styles: {} ({} fill images)",
                report.styles, report.fill_images
            )
            .ok();
            writeln!(
                buf,
                "Exports: {}/{} resolved in {} batches",
                report.exports.resolved,
                report.exports.total,
                report.batches.len()
            )
            .ok();

            let bump_code = match report.changes.bump {
                VersionBump::None => "90",
                VersionBump::Minor => "33",
                VersionBump::Major => "31",
            };
            let bump = color(&format!("{:?}", report.changes.bump).to_lowercase(), bump_code, colorize);
            let first = if report.changes.first_run { ", first run" } else { "" };
            writeln!(buf, "Changes: {bump}{first}").ok();
            for (category, changes) in &report.changes.categories {
                writeln!(
                    buf,
                    "- {:14} +{} ~{} -{}",
                    category,
                    changes.added.len(),
                    changes.updated.len(),
                    changes.deleted.len()
                )
                .ok();
            }

            if !report.files.is_empty() {
                writeln!(buf, "Files:").ok();
                for file in &report.files {
                    let outcome = match file.outcome {
                        WriteOutcome::Written => color("written", "32", colorize),
                        WriteOutcome::Unchanged => color("unchanged", "90", colorize),
                    };
                    writeln!(buf, "- {:10} {}", outcome, file.path.display()).ok();
                }
            }
            write_collisions(&mut buf, &report.collisions, colorize);
        }
        FigmintOutput::Inspect(out) => {
            let report = &out.report;
            let header = color("[INSPECT]", "36", colorize);
            writeln!(buf, "{header} {}", report.document_name).ok();
            writeln!(buf, "Styles: {}", report.styles.len()).ok();
            for style in &report.styles {
                writeln!(buf, "- {:?} {} ({})", style.category, style.name, style.key).ok();
            }
            writeln!(buf, "Exports: {}", report.exports.len()).ok();
            if !report.batches.is_empty() {
                writeln!(buf, "Batches:").ok();
                for batch in &report.batches {
                    writeln!(buf, "- {:8} {} ids", batch.key, batch.ids.len()).ok();
                }
            }
            write_collisions(&mut buf, &report.collisions, colorize);
        }
        FigmintOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            let message = out.message.as_deref().unwrap_or(out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

fn write_collisions(buf: &mut String, collisions: &[figmint_lib::NameCollision], colorize: bool) {
    if collisions.is_empty() {
        return;
    }
    writeln!(buf, "{}", color("Name collisions:", "33", colorize)).ok();
    for collision in collisions {
        writeln!(
            buf,
            "- {:?} {}: {} replaced {}",
            collision.category, collision.name, collision.kept, collision.replaced
        )
        .ok();
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figmint_lib::changes::{CategoryChanges, ChangeSet};
    use figmint_lib::error::{ErrorCategory, ErrorPayload};
    use figmint_lib::sync::{ExportCounts, SyncReport, WrittenFile};
    use indexmap::IndexMap;
    use std::path::PathBuf;

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(FigmintError::Config("boom".to_string()), OutputFormat::Json);
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn format_pretty_summarizes_sync() {
        let mut categories = IndexMap::new();
        categories.insert(
            "colors".to_string(),
            CategoryChanges {
                added: vec!["brandRed".into()],
                updated: vec![],
                deleted: vec!["oldBlue".into()],
            },
        );
        let output = FigmintOutput::sync(
            SyncReport {
                file_key: "abc".into(),
                document_name: "Kit".into(),
                document_version: None,
                output: PathBuf::from("figmaStyles"),
                styles: 4,
                fill_images: 1,
                exports: ExportCounts {
                    total: 3,
                    resolved: 2,
                },
                batches: vec!["svg".into(), "png@2x".into()],
                files: vec![WrittenFile {
                    path: PathBuf::from("figmaStyles/index.js"),
                    outcome: WriteOutcome::Unchanged,
                }],
                changes: ChangeSet {
                    first_run: false,
                    bump: VersionBump::Major,
                    categories,
                },
                collisions: vec![],
            },
            Some(3),
        );

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("[SYNC] Kit (run 3)"));
        assert!(pretty.contains("Styles: 4 (1 fill images)"));
        assert!(pretty.contains("Exports: 2/3 resolved in 2 batches"));
        assert!(pretty.contains("Changes: major"));
        assert!(pretty.contains("+1 ~0 -1"));
        assert!(pretty.contains("unchanged"));
        assert!(!pretty.contains("Name collisions"));
    }

    #[test]
    fn format_pretty_handles_errors() {
        let output = FigmintOutput::error(ErrorPayload {
            category: ErrorCategory::Config,
            message: "bad input".to_string(),
            remediation: Some("check flags".to_string()),
        });

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("[ERROR] bad input"));
        assert!(pretty.contains("Hint: check flags"));
    }
}
