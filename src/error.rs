use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::ParseError;

#[derive(Debug, Error)]
pub enum FigmintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Figma API error (status: {status:?}): {message}")]
    FigmaApi {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to download fill image {image_ref} for style {style_key}: {source}")]
    FillImage {
        style_key: String,
        image_ref: String,
        #[source]
        source: Box<FigmintError>,
    },

    #[error("Export batch {batch} failed: {source}")]
    ExportBatch {
        batch: String,
        #[source]
        source: Box<FigmintError>,
    },

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl FigmintError {
    pub fn figma_api(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        FigmintError::FigmaApi {
            status,
            message: message.into(),
        }
    }

    pub fn filesystem(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        FigmintError::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn export_batch(batch: impl Into<String>, source: FigmintError) -> Self {
        FigmintError::ExportBatch {
            batch: batch.into(),
            source: Box::new(source),
        }
    }

    pub fn fill_image(
        style_key: impl Into<String>,
        image_ref: impl Into<String>,
        source: FigmintError,
    ) -> Self {
        FigmintError::FillImage {
            style_key: style_key.into(),
            image_ref: image_ref.into(),
            source: Box::new(source),
        }
    }

    /// True when the failure came from the export step, leaving style output intact.
    pub fn is_export_failure(&self) -> bool {
        matches!(self, FigmintError::ExportBatch { .. })
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            FigmintError::Io(e) => ErrorPayload::new(
                ErrorCategory::Filesystem,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            FigmintError::Network(e) if e.is_timeout() => ErrorPayload::new(
                ErrorCategory::Network,
                e.to_string(),
                "The request timed out; raise --timeout (or request_timeout in the config) and retry.",
            ),
            FigmintError::Network(e) => ErrorPayload::new(
                ErrorCategory::Network,
                e.to_string(),
                "Check connectivity/proxy/VPN and retry.",
            ),
            FigmintError::InvalidUrl(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Verify base_url in the config (e.g., https://api.figma.com).",
            ),
            FigmintError::FigmaApi { status, message } => {
                let remediation = match status.map(|s| s.as_u16()) {
                    Some(403) => "Check that the token has access to this file.",
                    Some(404) => "Verify the Figma file key (the segment after /file/ in the URL).",
                    Some(429) => "Rate limited by Figma; wait before retrying.",
                    _ => "Check FIGMA_TOKEN and the file key; retry after waiting.",
                };
                ErrorPayload::new(
                    ErrorCategory::Figma,
                    format!("Figma API error (status {:?}): {}", status, message),
                    remediation,
                )
            }
            FigmintError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check the JSON input (saved document or snapshot); run with --verbose for details.",
            ),
            FigmintError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("token") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Set FIGMA_TOKEN (or FIGMA_OAUTH_TOKEN), or add `token` to figmint.toml.",
                    )
                } else if lower.contains("file key") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Pass --file <FILE_KEY> or set `file` in figmint.toml.",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags and the config file (figmint.toml / .figmintrc).",
                    )
                }
            }
            FigmintError::Filesystem { path, source } => ErrorPayload::new(
                ErrorCategory::Filesystem,
                format!("{}: {}", path.display(), source),
                "Check that the output directory is writable and not held open by another process.",
            ),
            FigmintError::FillImage {
                style_key,
                image_ref,
                source,
            } => ErrorPayload::new(
                ErrorCategory::Network,
                format!("fill image {image_ref} (style {style_key}): {source}"),
                "Image fills are required for styling output; retry once the image is reachable.",
            ),
            FigmintError::ExportBatch { batch, source } => ErrorPayload::new(
                ErrorCategory::Export,
                format!("export batch {batch}: {source}"),
                "Style output was written; rerun to retry exports.",
            ),
            FigmintError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, FigmintError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Network,
    Figma,
    Filesystem,
    Export,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_payload_includes_token_remediation() {
        let err = FigmintError::Config("Figma token missing".to_string());
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Config);
        let remediation = payload.remediation.unwrap_or_default();
        assert!(
            remediation.contains("FIGMA_TOKEN"),
            "expected token remediation, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_includes_file_key_hint() {
        let err = FigmintError::Config("Figma file key is required".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("--file"),
            "expected --file remediation, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_uses_default_remediation_for_other_messages() {
        let err = FigmintError::Config("Some other config issue".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("Check flags"),
            "expected default remediation for generic config errors"
        );
    }

    #[test]
    fn export_batch_is_its_own_category() {
        let err = FigmintError::export_batch(
            "png@2x",
            FigmintError::figma_api(Some(StatusCode::INTERNAL_SERVER_ERROR), "render failed"),
        );
        assert!(err.is_export_failure());
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Export);
        assert!(payload.message.contains("png@2x"));
        assert!(payload.message.contains("render failed"));
    }

    #[test]
    fn filesystem_error_names_the_path() {
        let err = FigmintError::filesystem(
            "out/exports",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_export_failure());
        let rendered = err.to_string();
        assert!(rendered.contains("out/exports"), "got: {rendered}");
        assert_eq!(err.to_payload().category, ErrorCategory::Filesystem);
    }

    #[test]
    fn fill_image_error_names_style_and_reference() {
        let err = FigmintError::fill_image(
            "S:abc",
            "img-1",
            FigmintError::figma_api(Some(StatusCode::NOT_FOUND), "gone"),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("S:abc"));
        assert!(rendered.contains("img-1"));
    }

    #[test]
    fn rate_limit_gets_wait_hint() {
        let err = FigmintError::figma_api(Some(StatusCode::TOO_MANY_REQUESTS), "slow down");
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(remediation.contains("Rate limited"), "got: {remediation}");
    }
}
