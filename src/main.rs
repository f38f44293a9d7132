mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_inspect, run_sync_command};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.quiet, args.verbose);

    match args.command {
        Commands::Sync {
            file,
            output,
            typescript,
            document,
            watch,
            format,
            timeout,
        } => {
            run_sync_command(
                args.config,
                file,
                output,
                typescript,
                document,
                watch,
                format,
                timeout,
            )
            .await
        }
        Commands::Inspect {
            file,
            document,
            format,
        } => run_inspect(args.config, file, document, format).await,
    }
}

/// Logs go to stderr; `FIGMINT_LOG` overrides the flag-derived level.
fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("FIGMINT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("failed to initialize tracing subscriber: {err}");
    }
}
