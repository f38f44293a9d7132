use std::path::PathBuf;
use std::process::ExitCode;

use figmint_lib::{inspect, FigmintError, FigmintOutput};
use tracing::debug;

use super::Source;
use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::load_config;

/// Run the inspect command.
pub async fn run_inspect(
    config_path: Option<PathBuf>,
    file: Option<String>,
    document: Option<PathBuf>,
    format: OutputFormat,
) -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let (config, config_source) = match load_config(config_path.as_deref(), &cwd) {
        Ok(loaded) => loaded,
        Err(err) => return render_error(err, format),
    };
    debug!(source = ?config_source, "config loaded");

    let file_key = file.or_else(|| config.file.clone());
    let source = match Source::build(
        document.as_deref(),
        file_key.as_deref(),
        &config,
        config.request_timeout,
    ) {
        Ok(source) => source,
        Err(err) => return render_error(err, format),
    };

    let report = match &source {
        Source::Figma { client, file_key } => inspect(client, file_key).await,
        Source::Offline { source, file_key } => inspect(source, file_key).await,
    };
    let body = match report {
        Ok(report) => FigmintOutput::inspect(report),
        Err(err) => return render_error(err, format),
    };
    if let Err(err) = write_output(&body, format) {
        return render_error(FigmintError::Io(err), format);
    }
    ExitCode::SUCCESS
}
