use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "figmint")]
#[command(
    version,
    about = "Figmint - Pull shared styles and exports out of a Figma file",
    long_about = "Figmint\n\nModes:\n- sync: fetch a Figma file, download fill images and exports, and write a generated styles module.\n- inspect: walk a Figma file and report styles, exports and planned download batches without writing anything.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose (debug) logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log errors"
    )]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (TOML, JSON or YAML); otherwise figmint.toml/.figmintrc in the working directory, then ~/.config/figmint/config.toml. CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the file, download assets and write the styles module
    Sync {
        #[arg(long, help = "Figma file key")]
        file: Option<String>,

        #[arg(long, short, help = "Output directory [default: figmaStyles]")]
        output: Option<PathBuf>,

        #[arg(long, help = "Generate index.ts instead of index.js")]
        typescript: bool,

        #[arg(
            long,
            value_name = "PATH",
            help = "Read a saved file response from disk instead of the Figma API"
        )]
        document: Option<PathBuf>,

        #[arg(long, help = "Re-run every watch_interval until interrupted")]
        watch: bool,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,

        #[arg(
            long,
            value_name = "SECS",
            help = "Per-request timeout for Figma API calls [default: 30]"
        )]
        timeout: Option<u64>,
    },

    /// Report styles, exports and download batches without writing anything
    Inspect {
        #[arg(long, help = "Figma file key")]
        file: Option<String>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Read a saved file response from disk instead of the Figma API"
        )]
        document: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json", help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "figmint",
            "--verbose",
            "sync",
            "--file",
            "abc",
            "-o",
            "theme",
            "--typescript",
            "--timeout",
            "5",
        ])
        .expect("parse");
        assert!(cli.verbose);
        match cli.command {
            Commands::Sync {
                file,
                output,
                typescript,
                timeout,
                format,
                watch,
                ..
            } => {
                assert_eq!(file.as_deref(), Some("abc"));
                assert_eq!(output, Some(PathBuf::from("theme")));
                assert!(typescript);
                assert!(!watch);
                assert_eq!(timeout, Some(5));
                assert_eq!(format, OutputFormat::Json);
            }
            Commands::Inspect { .. } => panic!("expected sync"),
        }
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["figmint", "--verbose", "--quiet", "inspect"]).is_err());
    }
}
