use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use figmint_lib::{run_sync, DesignSource, FigmintError, FigmintOutput, SyncOptions};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::Source;
use crate::cli::OutputFormat;
use crate::formatting::{render_error, write_output};
use crate::settings::{format_effective_settings, load_config, resolve_sync_settings};

/// Run the sync command, once or on every watch tick.
#[allow(clippy::too_many_arguments)]
pub async fn run_sync_command(
    config_path: Option<PathBuf>,
    file: Option<String>,
    output: Option<PathBuf>,
    typescript: bool,
    document: Option<PathBuf>,
    watch: bool,
    format: OutputFormat,
    timeout: Option<u64>,
) -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let (config, config_source) = match load_config(config_path.as_deref(), &cwd) {
        Ok(loaded) => loaded,
        Err(err) => return render_error(err, format),
    };
    let settings = resolve_sync_settings(file, output, typescript, timeout, &config);
    debug!("{}", format_effective_settings(&settings, config_source.as_deref()));

    let source = match Source::build(
        document.as_deref(),
        settings.file_key.as_deref(),
        &config,
        settings.request_timeout,
    ) {
        Ok(source) => source,
        Err(err) => return render_error(err, format),
    };

    let options = |file_key: &str| SyncOptions {
        file_key: file_key.to_string(),
        output: settings.output.clone(),
        typescript: settings.typescript,
    };
    match &source {
        Source::Figma { client, file_key } => {
            drive(client, &options(file_key.as_str()), watch, settings.watch_interval, format).await
        }
        Source::Offline { source, file_key } => {
            drive(source, &options(file_key.as_str()), watch, settings.watch_interval, format).await
        }
    }
}

async fn drive<S: DesignSource>(
    source: &S,
    options: &SyncOptions,
    watch: bool,
    interval: Duration,
    format: OutputFormat,
) -> ExitCode {
    if !watch {
        return sync_once(source, options, None, format).await;
    }

    info!(interval_ms = interval.as_millis() as u64, "watching for changes");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut run = 0u64;
    let mut last = ExitCode::SUCCESS;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run += 1;
                // A failed run is reported and the next tick retries.
                last = sync_once(source, options, Some(run), format).await;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(%err, "failed to listen for ctrl-c");
                }
                info!(runs = run, "watch stopped");
                return last;
            }
        }
    }
}

async fn sync_once<S: DesignSource>(
    source: &S,
    options: &SyncOptions,
    run: Option<u64>,
    format: OutputFormat,
) -> ExitCode {
    let body = match run_sync(source, options).await {
        Ok(report) => FigmintOutput::sync(report, run),
        Err(err) => return render_error(err, format),
    };
    if let Err(err) = write_output(&body, format) {
        return render_error(FigmintError::Io(err), format);
    }
    ExitCode::SUCCESS
}
