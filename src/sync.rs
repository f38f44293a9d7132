//! One pass of the pipeline: fetch, walk, resolve, project and write.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::changes::{diff, load_snapshot, ChangeSet};
use crate::codegen::{render_all, StylesModule, SNAPSHOT_FILE};
use crate::error::{FigmintError, Result};
use crate::exports::{
    batch_exports, resolve_exports, tree_records, DownloadBatches, ExportTree, EXPORTS_DIR,
};
use crate::figma::{DesignSource, StyleType};
use crate::paths::{ensure_dir, write_if_changed, WriteOutcome};
use crate::projection::{project, NameCollision, StyleProjection};
use crate::styles::{attach_metadata, resolve_styles, StyleCategory, FILL_IMAGES_DIR};
use crate::walker::{walk, ExportDeclarations};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub file_key: String,
    pub output: PathBuf,
    pub typescript: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportCounts {
    pub total: usize,
    pub resolved: usize,
}

impl ExportCounts {
    pub fn of(tree: &ExportTree) -> Self {
        tree_records(tree).fold(Self::default(), |mut counts, record| {
            counts.total += 1;
            if record.is_resolved() {
                counts.resolved += 1;
            }
            counts
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub file_key: String,
    pub document_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_version: Option<String>,
    pub output: PathBuf,
    pub styles: usize,
    pub fill_images: usize,
    pub exports: ExportCounts,
    pub batches: Vec<String>,
    pub files: Vec<WrittenFile>,
    pub changes: ChangeSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<NameCollision>,
}

/// Run the full pipeline against `source` and write everything under
/// `options.output`.
///
/// When an export batch fails, style output is still written (with the
/// unresolved export records) before the batch error is returned.
pub async fn run_sync<S: DesignSource>(source: &S, options: &SyncOptions) -> Result<SyncReport> {
    let key = options.file_key.as_str();
    let output = options.output.as_path();
    ensure_dir(output)?;

    let (file, image_fills) =
        tokio::try_join!(source.fetch_document(key), source.fetch_image_fills(key))?;
    info!(document = %file.name, image_fills = image_fills.len(), "document fetched");

    let discovery = walk(&file.document);
    let styles = resolve_styles(
        source,
        discovery.styles,
        &file.styles,
        &image_fills,
        &output.join(FILL_IMAGES_DIR),
    )
    .await?;

    let (skeleton, batches) = batch_exports(&discovery.exports);
    let (exports, export_error) = match resolve_exports(
        source,
        key,
        &batches,
        skeleton.clone(),
        &output.join(EXPORTS_DIR),
    )
    .await
    {
        Ok(tree) => (tree, None),
        Err(err) if err.is_export_failure() => {
            warn!(%err, "export resolution failed; writing style output without exports");
            (skeleton, Some(err))
        }
        Err(err) => return Err(err),
    };

    let (projection, collisions) = project(&styles);
    let changes = compare_with_snapshot(output, &projection)?;

    let module = StylesModule {
        typescript: options.typescript,
    };
    let files = render_all(module, &projection, &styles, &exports)?
        .into_iter()
        .map(|generated| {
            let path = output.join(generated.name);
            let outcome = write_if_changed(&path, &generated.contents)?;
            info!(path = %path.display(), ?outcome, "output file");
            Ok(WrittenFile { path, outcome })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(err) = export_error {
        return Err(err);
    }

    Ok(SyncReport {
        file_key: options.file_key.clone(),
        document_name: file.name,
        document_version: file.version,
        output: options.output.clone(),
        styles: styles.len(),
        fill_images: styles.values().filter(|s| s.file_name.is_some()).count(),
        exports: ExportCounts::of(&exports),
        batches: batches.keys().cloned().collect(),
        files,
        changes,
        collisions,
    })
}

fn compare_with_snapshot(output: &Path, projection: &StyleProjection) -> Result<ChangeSet> {
    let previous = load_snapshot(&output.join(SNAPSHOT_FILE))?;
    let current = serde_json::to_value(projection)?;
    Ok(diff(previous.as_ref(), &current))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSummary {
    pub key: String,
    pub name: String,
    pub style_type: StyleType,
    pub category: StyleCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    pub key: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub file_key: String,
    pub document_name: String,
    pub styles: Vec<StyleSummary>,
    pub exports: ExportDeclarations,
    pub batches: Vec<BatchPlan>,
    pub projection: StyleProjection,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<NameCollision>,
}

/// Walk and project without downloading or writing anything.
pub async fn inspect<S: DesignSource>(source: &S, file_key: &str) -> Result<InspectReport> {
    let file = source.fetch_document(file_key).await?;
    let discovery = walk(&file.document);
    let (_, batches) = batch_exports(&discovery.exports);
    let styles = attach_metadata(discovery.styles, &file.styles);
    let (projection, collisions) = project(&styles);

    Ok(InspectReport {
        file_key: file_key.to_string(),
        document_name: file.name,
        styles: styles
            .values()
            .map(|style| StyleSummary {
                key: style.key.clone(),
                name: style.name.clone(),
                style_type: style.style_type,
                category: style.category,
            })
            .collect(),
        exports: discovery.exports,
        batches: plan(&batches),
        projection,
        collisions,
    })
}

fn plan(batches: &DownloadBatches) -> Vec<BatchPlan> {
    batches
        .values()
        .map(|batch| BatchPlan {
            key: batch.key.clone(),
            ids: batch.ids(),
        })
        .collect()
}

/// Reject a missing file key before any request is made.
pub fn require_file_key(file_key: Option<&str>) -> Result<String> {
    file_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            FigmintError::Config(
                "Figma file key is required (pass --file or set `file` in the config)".into(),
            )
        })
}
