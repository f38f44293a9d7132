//! Export batching and resolution.
//!
//! Declarations are flattened into one record per (page, name, format,
//! scale), laid out in a skeleton tree before any network call, and grouped
//! into download batches so that each distinct format (and scale, for raster
//! formats) costs exactly one URL-resolution request.

use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{FigmintError, Result};
use crate::figma::{DesignSource, ExportFormat};
use crate::names::camel_case;
use crate::paths::{ensure_dir, reset_dir, sanitize_relative};
use crate::walker::{ExportDeclarations, NO_PAGE};

/// Directory (under the output root) that receives exported renditions.
pub const EXPORTS_DIR: &str = "exports";

/// A positive, finite export scale. Ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale(f64);

impl Scale {
    pub const ONE: Scale = Scale(1.0);

    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Scale(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `@2x` style suffix, empty at scale 1. Downscales get one too, so a
    /// `@0.5x` render never overwrites the 1x file.
    pub fn file_suffix(&self) -> String {
        if *self == Scale::ONE {
            String::new()
        } else {
            format!("@{self}x")
        }
    }
}

impl Eq for Scale {}

impl PartialOrd for Scale {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scale {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Scale {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One rendition of one node. `url`, `directory`, `file` and `path` are
/// filled in once the rendition has been resolved and downloaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: String,
    pub format: ExportFormat,
    pub page: String,
    pub group: String,
    pub name: String,
    pub scale: Scale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ExportRecord {
    pub fn is_resolved(&self) -> bool {
        self.path.is_some()
    }

    /// Local destination `{root}/{camelCase(page)}/{name}[@{scale}x].{format}`.
    /// Slashes in the node name become subdirectories.
    pub fn location(&self, exports_root: &Path) -> (PathBuf, String) {
        let page_dir = Some(camel_case(&self.page))
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| NO_PAGE.to_string());
        let relative = sanitize_relative(&self.name);
        let stem = relative
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.replace(':', "-"));
        let mut directory = exports_root.join(page_dir);
        if let Some(parent) = relative.parent() {
            directory.push(parent);
        }
        let file = format!("{stem}{}.{}", self.scale.file_suffix(), self.format);
        (directory, file)
    }
}

/// Renditions of one node name on one page. Vector formats have no scale
/// axis; raster formats are keyed by scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatExports {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<ExportRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<ExportRecord>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub png: BTreeMap<Scale, ExportRecord>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub jpg: BTreeMap<Scale, ExportRecord>,
}

impl FormatExports {
    /// Place `record` in its slot, returning whatever occupied it.
    pub fn insert(&mut self, record: ExportRecord) -> Option<ExportRecord> {
        match record.format {
            ExportFormat::Svg => self.svg.replace(record),
            ExportFormat::Pdf => self.pdf.replace(record),
            ExportFormat::Png => self.png.insert(record.scale, record),
            ExportFormat::Jpg => self.jpg.insert(record.scale, record),
        }
    }

    pub fn get(&self, format: ExportFormat, scale: Scale) -> Option<&ExportRecord> {
        match format {
            ExportFormat::Svg => self.svg.as_ref(),
            ExportFormat::Pdf => self.pdf.as_ref(),
            ExportFormat::Png => self.png.get(&scale),
            ExportFormat::Jpg => self.jpg.get(&scale),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &ExportRecord> {
        self.svg
            .iter()
            .chain(self.pdf.iter())
            .chain(self.png.values())
            .chain(self.jpg.values())
    }
}

/// page → name → format[/scale] → record.
pub type ExportTree = IndexMap<String, IndexMap<String, FormatExports>>;

/// Every record of a tree, in page/name order.
pub fn tree_records(tree: &ExportTree) -> impl Iterator<Item = &ExportRecord> {
    tree.values()
        .flat_map(|names| names.values())
        .flat_map(FormatExports::records)
}

/// Records sharing one format and, for raster formats, one scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBatch {
    pub key: String,
    pub format: ExportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
    pub records: Vec<ExportRecord>,
}

impl DownloadBatch {
    /// Distinct node ids, in record order.
    pub fn ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|record| seen.insert(record.id.as_str()))
            .map(|record| record.id.clone())
            .collect()
    }
}

/// Batches keyed by `svg`, `pdf`, or `{format}@{scale}x`, in order of first use.
pub type DownloadBatches = IndexMap<String, DownloadBatch>;

pub fn batch_key(format: ExportFormat, scale: Scale) -> String {
    if format.is_vector() {
        format.to_string()
    } else {
        format!("{format}@{scale}x")
    }
}

/// Flatten declarations into the skeleton tree and the download batches.
///
/// Two records landing on the same (page, name, format, scale) leaf collide;
/// the later one replaces the earlier in both the tree and its batch.
pub fn batch_exports(declarations: &ExportDeclarations) -> (ExportTree, DownloadBatches) {
    let mut tree = ExportTree::new();
    let mut batches = DownloadBatches::new();

    for decl in declarations.values() {
        for setting in &decl.settings {
            let Some(format) = ExportFormat::parse(&setting.format) else {
                warn!(node = %decl.id, format = %setting.format, "skipping unsupported export format");
                continue;
            };
            let scale = if format.is_vector() {
                Scale::ONE
            } else {
                match Scale::new(setting.scale()) {
                    Some(scale) => scale,
                    None => {
                        warn!(node = %decl.id, scale = setting.scale(), "skipping export with invalid scale");
                        continue;
                    }
                }
            };

            let record = ExportRecord {
                id: decl.id.clone(),
                format,
                page: decl.page.clone(),
                group: decl.folder.clone(),
                name: decl.name.clone(),
                scale,
                url: None,
                directory: None,
                file: None,
                path: None,
            };

            let key = batch_key(format, scale);
            let batch = batches.entry(key.clone()).or_insert_with(|| DownloadBatch {
                key,
                format,
                scale: (!format.is_vector()).then_some(scale),
                records: Vec::new(),
            });

            let previous = tree
                .entry(record.page.clone())
                .or_default()
                .entry(record.name.clone())
                .or_default()
                .insert(record.clone());
            if let Some(previous) = previous {
                warn!(
                    page = %record.page,
                    name = %record.name,
                    format = %format,
                    scale = %scale,
                    replaced = %previous.id,
                    by = %record.id,
                    "export name collision; keeping the later node"
                );
                batch
                    .records
                    .retain(|r| !(r.page == previous.page && r.name == previous.name));
            }
            batch.records.push(record);
        }
    }

    batches.retain(|_, batch| !batch.records.is_empty());
    debug!(batches = batches.len(), pages = tree.len(), "exports batched");
    (tree, batches)
}

/// Resolve every batch concurrently, download each rendition and merge the
/// resolved records into `skeleton`.
///
/// `exports_root` is cleared first. Every download has completed when this
/// returns. Any batch failure fails the whole step as
/// [`FigmintError::ExportBatch`].
pub async fn resolve_exports<S: DesignSource>(
    source: &S,
    file_key: &str,
    batches: &DownloadBatches,
    skeleton: ExportTree,
    exports_root: &Path,
) -> Result<ExportTree> {
    reset_dir(exports_root)?;

    info!(batches = batches.len(), "resolving export batches");
    let resolved = try_join_all(
        batches
            .values()
            .filter(|batch| !batch.records.is_empty())
            .map(|batch| resolve_batch(source, file_key, batch, exports_root)),
    )
    .await?;

    let mut tree = skeleton;
    for record in resolved.into_iter().flatten() {
        let slot = tree
            .get_mut(&record.page)
            .and_then(|names| names.get_mut(&record.name));
        match slot {
            Some(formats) => {
                formats.insert(record);
            }
            None => debug!(id = %record.id, "resolved export has no skeleton leaf"),
        }
    }
    Ok(tree)
}

async fn resolve_batch<S: DesignSource>(
    source: &S,
    file_key: &str,
    batch: &DownloadBatch,
    exports_root: &Path,
) -> Result<Vec<ExportRecord>> {
    let ids = batch.ids();
    let scale = batch.scale.map(|s| s.value());
    let urls: HashMap<String, Option<String>> = source
        .export_urls(file_key, &ids, batch.format, scale)
        .await
        .map_err(|err| FigmintError::export_batch(&batch.key, err))?;
    debug!(batch = %batch.key, ids = ids.len(), urls = urls.len(), "batch resolved");

    let downloads = batch.records.iter().filter_map(|record| {
        match urls.get(&record.id) {
            Some(Some(url)) => Some(download_record(source, record, url, exports_root, &batch.key)),
            Some(None) => {
                warn!(batch = %batch.key, id = %record.id, name = %record.name, "render failed; export left unresolved");
                None
            }
            None => {
                warn!(batch = %batch.key, id = %record.id, name = %record.name, "no URL returned; export left unresolved");
                None
            }
        }
    });
    try_join_all(downloads).await
}

async fn download_record<S: DesignSource>(
    source: &S,
    record: &ExportRecord,
    url: &str,
    exports_root: &Path,
    batch_key: &str,
) -> Result<ExportRecord> {
    let (directory, file) = record.location(exports_root);
    ensure_dir(&directory)?;
    let bytes = source
        .download(url)
        .await
        .map_err(|err| FigmintError::export_batch(batch_key, err))?;
    let path = directory.join(&file);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|err| FigmintError::filesystem(&path, err))?;
    debug!(id = %record.id, path = %path.display(), "export written");

    Ok(ExportRecord {
        url: Some(url.to_string()),
        directory: Some(directory.display().to_string()),
        file: Some(file),
        path: Some(path),
        ..record.clone()
    })
}
