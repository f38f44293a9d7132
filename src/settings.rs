use std::path::{Path, PathBuf};
use std::time::Duration;

use figmint_lib::{Config, FigmintError};

/// Resolved settings after merging CLI args and config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSyncSettings {
    pub file_key: Option<String>,
    pub output: PathBuf,
    pub typescript: bool,
    pub request_timeout: Duration,
    pub watch_interval: Duration,
}

/// Merge CLI arguments with the config file, preferring CLI values that were given.
pub fn resolve_sync_settings(
    cli_file: Option<String>,
    cli_output: Option<PathBuf>,
    cli_typescript: bool,
    cli_timeout: Option<u64>,
    config: &Config,
) -> ResolvedSyncSettings {
    ResolvedSyncSettings {
        file_key: cli_file.or_else(|| config.file.clone()),
        output: cli_output.unwrap_or_else(|| config.output.clone()),
        typescript: cli_typescript || config.typescript,
        request_timeout: cli_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(config.request_timeout),
        watch_interval: config.watch_interval,
    }
}

/// Load config from an explicit path, a discovered file, or defaults.
/// Priority: explicit path > ./figmint.toml, ./.figmintrc* > ~/.config/figmint/config.toml > defaults
pub fn load_config(
    path: Option<&Path>,
    cwd: &Path,
) -> Result<(Config, Option<PathBuf>), FigmintError> {
    let (cfg, source) = Config::load(path, cwd).map_err(|e| match e {
        FigmintError::Config(_) => e,
        other => {
            let loc = path
                .map(Path::to_path_buf)
                .or_else(|| Config::discover(cwd))
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string());
            FigmintError::Config(format!("Failed to read config {}: {}", loc, other))
        }
    })?;

    cfg.validate().map_err(|e| {
        let prefix = source
            .as_deref()
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        FigmintError::Config(prefix)
    })?;
    Ok((cfg, source))
}

/// Format effective settings as a single-line string.
pub fn format_effective_settings(
    settings: &ResolvedSyncSettings,
    config_source: Option<&Path>,
) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    format!(
        "Effective config [{source}]: file={}, output={}, typescript={}, timeout={}s, watch_interval={}ms",
        settings.file_key.as_deref().unwrap_or("<none>"),
        settings.output.display(),
        settings.typescript,
        settings.request_timeout.as_secs(),
        settings.watch_interval.as_millis(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_prefers_config_when_flags_absent() {
        let cfg = Config {
            file: Some("from-config".into()),
            output: PathBuf::from("theme"),
            typescript: true,
            request_timeout: Duration::from_secs(5),
            ..Config::default()
        };
        let resolved = resolve_sync_settings(None, None, false, None, &cfg);

        assert_eq!(resolved.file_key.as_deref(), Some("from-config"));
        assert_eq!(resolved.output, PathBuf::from("theme"));
        assert!(resolved.typescript);
        assert_eq!(resolved.request_timeout, Duration::from_secs(5));
        assert_eq!(resolved.watch_interval, Duration::from_secs(1));
    }

    #[test]
    fn resolve_prefers_cli_when_flags_present() {
        let cfg = Config {
            file: Some("from-config".into()),
            ..Config::default()
        };
        let resolved = resolve_sync_settings(
            Some("from-cli".into()),
            Some(PathBuf::from("out")),
            true,
            Some(9),
            &cfg,
        );

        assert_eq!(resolved.file_key.as_deref(), Some("from-cli"));
        assert_eq!(resolved.output, PathBuf::from("out"));
        assert!(resolved.typescript);
        assert_eq!(resolved.request_timeout, Duration::from_secs(9));
    }

    #[test]
    fn load_config_wraps_invalid_values_with_location() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("figmint.toml");
        std::fs::write(&path, "request_timeout = \"0s\"\n").expect("write");

        let err = load_config(None, dir.path()).expect_err("zero timeout");
        let message = err.to_string();
        assert!(message.contains("Invalid config"));
        assert!(message.contains("figmint.toml"));
    }

    #[test]
    fn load_config_reports_missing_explicit_file() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let err = load_config(Some(&missing), dir.path()).expect_err("missing");
        assert!(matches!(err, FigmintError::Config(msg) if msg.contains("nope.toml")));
    }

    #[test]
    fn format_effective_settings_includes_all_fields() {
        let summary = format_effective_settings(
            &ResolvedSyncSettings {
                file_key: Some("abc".into()),
                output: PathBuf::from("figmaStyles"),
                typescript: false,
                request_timeout: Duration::from_secs(30),
                watch_interval: Duration::from_millis(1500),
            },
            Some(Path::new("figmint.toml")),
        );
        assert!(summary.contains("file=abc"));
        assert!(summary.contains("output=figmaStyles"));
        assert!(summary.contains("timeout=30s"));
        assert!(summary.contains("watch_interval=1500ms"));
        assert!(summary.contains("figmint.toml"));
    }
}
