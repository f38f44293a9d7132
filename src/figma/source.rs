//! The seam between the pipeline and wherever the design document comes from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::api_types::{from_json_str, ExportFormat, FileResponse};
use crate::error::{FigmintError, Result};

/// Remote capabilities the pipeline depends on.
///
/// [`crate::figma_client::FigmaClient`] is the network implementation;
/// [`OfflineSource`] replays a saved file response.
#[allow(async_fn_in_trait)]
pub trait DesignSource {
    /// Fetch the document tree and style metadata of a file.
    async fn fetch_document(&self, file_key: &str) -> Result<FileResponse>;

    /// Image reference to download URL for every image fill in the file.
    async fn fetch_image_fills(&self, file_key: &str) -> Result<HashMap<String, String>>;

    /// Resolve render URLs for `ids` in one call. `scale` is only passed for
    /// raster formats. A `None` URL means the node could not be rendered.
    async fn export_urls(
        &self,
        file_key: &str,
        ids: &[String],
        format: ExportFormat,
        scale: Option<f64>,
    ) -> Result<HashMap<String, Option<String>>>;

    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// A saved `/v1/files/:key` response read from disk.
///
/// Has no image fills and resolves no export URLs, so export records stay
/// unresolved and no asset is downloaded.
#[derive(Debug, Clone)]
pub struct OfflineSource {
    path: PathBuf,
    file: FileResponse,
}

impl OfflineSource {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw =
            std::fs::read_to_string(path).map_err(|err| FigmintError::filesystem(path, err))?;
        let file: FileResponse = from_json_str(&raw)?;
        debug!(path = %path.display(), name = %file.name, "loaded saved document");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl DesignSource for OfflineSource {
    async fn fetch_document(&self, _file_key: &str) -> Result<FileResponse> {
        Ok(self.file.clone())
    }

    async fn fetch_image_fills(&self, _file_key: &str) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }

    async fn export_urls(
        &self,
        _file_key: &str,
        _ids: &[String],
        _format: ExportFormat,
        _scale: Option<f64>,
    ) -> Result<HashMap<String, Option<String>>> {
        Ok(HashMap::new())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        Err(FigmintError::Config(format!(
            "cannot download {url} while reading a saved document ({})",
            self.path.display()
        )))
    }
}
