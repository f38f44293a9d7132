use crate::error::ErrorPayload;
use crate::sync::{InspectReport, SyncReport};
use serde::Serialize;

/// Schema version for output payloads.
pub const FIGMINT_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum FigmintOutput {
    Sync(SyncOutput),
    Inspect(InspectOutput),
    Error(ErrorOutput),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutput {
    pub version: String,
    /// 1-based run number in watch mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<u64>,
    #[serde(flatten)]
    pub report: SyncReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectOutput {
    pub version: String,
    #[serde(flatten)]
    pub report: InspectReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

impl FigmintOutput {
    pub fn sync(report: SyncReport, run: Option<u64>) -> Self {
        FigmintOutput::Sync(SyncOutput {
            version: FIGMINT_OUTPUT_VERSION.to_string(),
            run,
            report,
        })
    }

    pub fn inspect(report: InspectReport) -> Self {
        FigmintOutput::Inspect(InspectOutput {
            version: FIGMINT_OUTPUT_VERSION.to_string(),
            report,
        })
    }

    pub fn error(payload: ErrorPayload) -> Self {
        FigmintOutput::Error(ErrorOutput {
            version: FIGMINT_OUTPUT_VERSION.to_string(),
            message: Some(payload.message.clone()),
            error: payload,
        })
    }
}
