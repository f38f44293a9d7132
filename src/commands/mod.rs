mod inspect;
mod sync;

pub use inspect::run_inspect;
pub use sync::run_sync_command;

use std::path::Path;
use std::time::Duration;

use figmint_lib::sync::require_file_key;
use figmint_lib::{Config, FigmaAuth, FigmaClient, OfflineSource, Result};

/// File key reported for runs against a saved document without `--file`.
pub const OFFLINE_FILE_KEY: &str = "offline";

/// Where the document comes from for one command.
pub enum Source {
    Figma { client: FigmaClient, file_key: String },
    Offline { source: OfflineSource, file_key: String },
}

impl Source {
    /// A saved document when `document` is given, otherwise the Figma API
    /// (which needs a file key and a token).
    pub fn build(
        document: Option<&Path>,
        file_key: Option<&str>,
        config: &Config,
        timeout: Duration,
    ) -> Result<Self> {
        if let Some(path) = document {
            let file_key = file_key.unwrap_or(OFFLINE_FILE_KEY).to_string();
            return Ok(Source::Offline {
                source: OfflineSource::load(path)?,
                file_key,
            });
        }

        let file_key = require_file_key(file_key)?;
        let auth = FigmaAuth::resolve(config.token.as_deref())?;
        let client = FigmaClient::with_base_url_and_timeout(auth, &config.base_url, timeout)?;
        Ok(Source::Figma { client, file_key })
    }
}
