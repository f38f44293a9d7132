use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{FigmintError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.figma.com";
pub const DEFAULT_OUTPUT_DIR: &str = "figmaStyles";

/// Config files looked up in the working directory, in order.
pub const LOCAL_CONFIG_FILES: [&str; 5] = [
    "figmint.toml",
    ".figmintrc",
    ".figmintrc.json",
    ".figmintrc.yaml",
    ".figmintrc.yml",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Personal access token; takes precedence over the environment.
    pub token: Option<String>,
    /// Figma file key.
    pub file: Option<String>,
    pub output: PathBuf,
    pub typescript: bool,
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub watch_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            file: None,
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            typescript: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            watch_interval: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Load from `path` if given, otherwise from the first config file found
    /// in `cwd`, then the central config, then defaults.
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = path {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        match Self::discover(cwd) {
            Some(found) => Ok((Self::from_file(&found)?, Some(found))),
            None => Ok((Self::default(), None)),
        }
    }

    /// First existing local config file, else the central one.
    pub fn discover(cwd: &Path) -> Option<PathBuf> {
        LOCAL_CONFIG_FILES
            .iter()
            .map(|name| cwd.join(name))
            .find(|candidate| candidate.is_file())
            .or_else(|| Self::central_config_path().filter(|p| p.is_file()))
    }

    /// `<config dir>/figmint/config.toml`, e.g. `~/.config/figmint/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("figmint").join("config.toml"))
    }

    /// Parse by extension: `.toml`, `.json`, `.yaml`/`.yml`. The extensionless
    /// `.figmintrc` may hold JSON or YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| FigmintError::filesystem(path, err))?;
        let invalid = |err: String| {
            FigmintError::Config(format!("Failed to parse config {}: {err}", path.display()))
        };
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => toml::from_str(&raw).map_err(|e| invalid(e.to_string())),
            Some("json") => serde_json::from_str(&raw).map_err(|e| invalid(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&raw).map_err(|e| invalid(e.to_string())),
            _ => serde_json::from_str(&raw)
                .or_else(|_| serde_yaml::from_str(&raw))
                .map_err(|e| invalid(e.to_string())),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(FigmintError::Config("output directory must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(FigmintError::Config("request_timeout must be greater than zero".into()));
        }
        if self.watch_interval.is_zero() {
            return Err(FigmintError::Config("watch_interval must be greater than zero".into()));
        }
        let base = Url::parse(&self.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(FigmintError::Config(format!(
                "base_url must be http(s), got {}",
                self.base_url
            )));
        }
        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(FigmintError::Config("token in config must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.output, PathBuf::from("figmaStyles"));
        assert_eq!(cfg.base_url, "https://api.figma.com");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.watch_interval, Duration::from_secs(1));
        assert!(!cfg.typescript);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn toml_config_overrides_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("figmint.toml");
        std::fs::write(
            &path,
            "file = \"abc123\"\noutput = \"src/theme\"\ntypescript = true\nrequest_timeout = \"45s\"\n",
        )
        .expect("write");

        let (cfg, source) = Config::load(None, dir.path()).expect("load");
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(cfg.file.as_deref(), Some("abc123"));
        assert_eq!(cfg.output, PathBuf::from("src/theme"));
        assert!(cfg.typescript);
        assert_eq!(cfg.request_timeout, Duration::from_secs(45));
        assert_eq!(cfg.watch_interval, Duration::from_secs(1));
    }

    #[test]
    fn figmintrc_accepts_json_and_yaml() {
        let dir = TempDir::new().expect("tempdir");
        let rc = dir.path().join(".figmintrc");
        std::fs::write(&rc, r#"{"file": "from-json", "watch_interval": "2s"}"#).expect("write");
        let cfg = Config::from_file(&rc).expect("json rc");
        assert_eq!(cfg.file.as_deref(), Some("from-json"));
        assert_eq!(cfg.watch_interval, Duration::from_secs(2));

        let yaml = dir.path().join(".figmintrc.yaml");
        std::fs::write(&yaml, "file: from-yaml\ntypescript: true\n").expect("write");
        let cfg = Config::from_file(&yaml).expect("yaml rc");
        assert_eq!(cfg.file.as_deref(), Some("from-yaml"));
        assert!(cfg.typescript);
    }

    #[test]
    fn explicit_path_wins_over_discovery() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(dir.path().join("figmint.toml"), "file = \"local\"\n").expect("write");
        let explicit = dir.path().join("other.json");
        std::fs::write(&explicit, r#"{"file": "explicit"}"#).expect("write");

        let (cfg, source) = Config::load(Some(&explicit), dir.path()).expect("load");
        assert_eq!(cfg.file.as_deref(), Some("explicit"));
        assert_eq!(source, Some(explicit));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("figmint.toml");
        std::fs::write(&path, "colour = \"red\"\n").expect("write");
        let err = Config::from_file(&path).expect_err("unknown key");
        assert!(matches!(err, FigmintError::Config(msg) if msg.contains("figmint.toml")));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero_timeout = Config {
            request_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert!(zero_timeout.validate().is_err());

        let bad_url = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(bad_url.validate(), Err(FigmintError::InvalidUrl(_))));

        let ftp = Config {
            base_url: "ftp://api.figma.com".into(),
            ..Config::default()
        };
        assert!(matches!(ftp.validate(), Err(FigmintError::Config(_))));

        let empty_output = Config {
            output: PathBuf::new(),
            ..Config::default()
        };
        assert!(empty_output.validate().is_err());
    }
}
