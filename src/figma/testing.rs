//! In-memory [`DesignSource`] for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use reqwest::StatusCode;

use super::api_types::{ExportFormat, FileResponse};
use super::source::DesignSource;
use crate::error::{FigmintError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportCall {
    pub ids: Vec<String>,
    pub format: ExportFormat,
    pub scale: Option<f64>,
}

#[derive(Debug, Default)]
pub struct FakeSource {
    document: Option<FileResponse>,
    image_fills: HashMap<String, String>,
    export_urls: HashMap<String, Option<String>>,
    failing_formats: HashSet<ExportFormat>,
    payloads: HashMap<String, Vec<u8>>,
    export_calls: Mutex<Vec<ExportCall>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_document(mut self, document: FileResponse) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_image_fill(mut self, image_ref: &str, url: &str) -> Self {
        self.image_fills.insert(image_ref.into(), url.into());
        self
    }

    /// Register the render URL for a node id; `None` simulates a failed render.
    pub fn with_export_url(mut self, id: &str, url: Option<&str>) -> Self {
        self.export_urls.insert(id.into(), url.map(str::to_owned));
        self
    }

    pub fn failing_format(mut self, format: ExportFormat) -> Self {
        self.failing_formats.insert(format);
        self
    }

    pub fn with_download(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.payloads.insert(url.into(), bytes);
        self
    }

    pub fn export_calls(&self) -> Vec<ExportCall> {
        self.export_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl DesignSource for FakeSource {
    async fn fetch_document(&self, _file_key: &str) -> Result<FileResponse> {
        self.document
            .clone()
            .ok_or_else(|| FigmintError::figma_api(Some(StatusCode::NOT_FOUND), "no document"))
    }

    async fn fetch_image_fills(&self, _file_key: &str) -> Result<HashMap<String, String>> {
        Ok(self.image_fills.clone())
    }

    async fn export_urls(
        &self,
        _file_key: &str,
        ids: &[String],
        format: ExportFormat,
        scale: Option<f64>,
    ) -> Result<HashMap<String, Option<String>>> {
        if let Ok(mut calls) = self.export_calls.lock() {
            calls.push(ExportCall {
                ids: ids.to_vec(),
                format,
                scale,
            });
        }
        if self.failing_formats.contains(&format) {
            return Err(FigmintError::figma_api(
                Some(StatusCode::INTERNAL_SERVER_ERROR),
                format!("render failed for {format}"),
            ));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.export_urls.get(id).map(|url| (id.clone(), url.clone())))
            .collect())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push(url.to_string());
        }
        self.payloads.get(url).cloned().ok_or_else(|| {
            FigmintError::figma_api(Some(StatusCode::NOT_FOUND), format!("no payload for {url}"))
        })
    }
}
