//! Style definitions discovered in the document tree and their resolution
//! against the file's style metadata and image fills.

use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{FigmintError, Result};
use crate::figma::{DesignSource, Effect, LayoutGrid, Paint, PaintKind, StyleMetadata, StyleType, TypeStyle};
use crate::paths::{reset_dir, sanitize_relative};

/// Directory (under the output root) that receives image-fill assets.
pub const FILL_IMAGES_DIR: &str = "fillImages";

/// Which node field a style key was attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleCategory {
    Text,
    Grid,
    Background,
    Stroke,
    Fill,
    Effect,
}

impl StyleCategory {
    /// Parse a key of a node's `styles` map. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "text" => Some(StyleCategory::Text),
            "grid" | "grids" => Some(StyleCategory::Grid),
            "background" => Some(StyleCategory::Background),
            "stroke" | "strokes" => Some(StyleCategory::Stroke),
            "fill" | "fills" => Some(StyleCategory::Fill),
            "effect" | "effects" => Some(StyleCategory::Effect),
            _ => None,
        }
    }

    /// The style type a key of this category has when the file metadata
    /// does not say.
    pub fn style_type(&self) -> StyleType {
        match self {
            StyleCategory::Fill | StyleCategory::Stroke | StyleCategory::Background => {
                StyleType::Fill
            }
            StyleCategory::Text => StyleType::Text,
            StyleCategory::Effect => StyleType::Effect,
            StyleCategory::Grid => StyleType::Grid,
        }
    }
}

/// Category-specific properties of a style.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StylePayload {
    Text(TypeStyle),
    Grid(Vec<LayoutGrid>),
    Background(Vec<Paint>),
    Stroke(Vec<Paint>),
    Fill(Vec<Paint>),
    Effect(Vec<Effect>),
}

impl StylePayload {
    pub fn paints(&self) -> Option<&[Paint]> {
        match self {
            StylePayload::Background(paints)
            | StylePayload::Stroke(paints)
            | StylePayload::Fill(paints) => Some(paints),
            _ => None,
        }
    }
}

/// A style key as first encountered in the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefinition {
    pub key: String,
    pub category: StyleCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<StylePayload>,
}

/// Style definitions in first-encounter order.
pub type StyleDefinitions = IndexMap<String, StyleDefinition>;

/// A style definition merged with its metadata and, for image fills, the
/// locally downloaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    pub key: String,
    pub name: String,
    pub style_type: StyleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: StyleCategory,
    #[serde(rename = "styles", skip_serializing_if = "Option::is_none")]
    pub payload: Option<StylePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl ResolvedStyle {
    /// Image references of the `IMAGE` paints of a fill style.
    pub fn image_refs(&self) -> impl Iterator<Item = &str> {
        let paints = match (self.style_type, &self.payload) {
            (StyleType::Fill, Some(payload)) => payload.paints().unwrap_or_default(),
            _ => &[],
        };
        paints
            .iter()
            .filter(|paint| paint.kind == PaintKind::Image)
            .filter_map(|paint| paint.image_ref.as_deref())
    }
}

pub type ResolvedStyles = IndexMap<String, ResolvedStyle>;

/// Merge definitions with the document's style metadata. No I/O.
pub fn attach_metadata(
    definitions: StyleDefinitions,
    metadata: &IndexMap<String, StyleMetadata>,
) -> ResolvedStyles {
    definitions
        .into_iter()
        .map(|(key, definition)| {
            let meta = metadata.get(&key);
            let style_type = meta
                .map(|m| m.style_type)
                .filter(|t| *t != StyleType::Unknown)
                .unwrap_or_else(|| definition.category.style_type());
            let resolved = ResolvedStyle {
                name: meta
                    .map(|m| m.name.clone())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| key.clone()),
                style_type,
                description: meta
                    .and_then(|m| m.description.clone())
                    .filter(|d| !d.is_empty()),
                category: definition.category,
                payload: definition.payload,
                file_name: None,
                key: key.clone(),
            };
            (key, resolved)
        })
        .collect()
}

/// Resolve style definitions: attach metadata, then download every image
/// fill into `fill_images_dir` (cleared first) and record the resulting file
/// name on the style that references it.
///
/// A reference missing from `image_fills` leaves the style's `file_name`
/// unset. A failed download fails the whole resolution.
pub async fn resolve_styles<S: DesignSource>(
    source: &S,
    definitions: StyleDefinitions,
    metadata: &IndexMap<String, StyleMetadata>,
    image_fills: &HashMap<String, String>,
    fill_images_dir: &Path,
) -> Result<ResolvedStyles> {
    reset_dir(fill_images_dir)?;

    let mut styles = attach_metadata(definitions, metadata);

    // One download per distinct reference, attributed to the first style using it.
    let mut pending: IndexMap<&str, (&str, &str)> = IndexMap::new();
    for style in styles.values() {
        for image_ref in style.image_refs() {
            match image_fills.get(image_ref) {
                Some(url) => {
                    pending
                        .entry(image_ref)
                        .or_insert((style.key.as_str(), url.as_str()));
                }
                None => warn!(
                    style = %style.key,
                    image_ref,
                    "image fill has no URL; leaving the style without a file"
                ),
            }
        }
    }

    info!(count = pending.len(), "downloading fill images");
    let downloads = pending.iter().map(|(image_ref, (style_key, url))| async move {
        let file_name = download_fill_image(source, image_ref, url, fill_images_dir)
            .await
            .map_err(|err| FigmintError::fill_image(*style_key, *image_ref, err))?;
        Ok::<_, FigmintError>((image_ref.to_string(), file_name))
    });
    let downloaded: HashMap<String, String> = try_join_all(downloads).await?.into_iter().collect();

    for style in styles.values_mut() {
        // Scoped per key: the last resolvable image paint of this style wins.
        let file_name = style
            .image_refs()
            .filter_map(|image_ref| downloaded.get(image_ref))
            .last()
            .cloned();
        if file_name.is_some() {
            style.file_name = file_name;
        }
    }

    Ok(styles)
}

async fn download_fill_image<S: DesignSource>(
    source: &S,
    image_ref: &str,
    url: &str,
    dir: &Path,
) -> Result<String> {
    let bytes = source.download(url).await?;
    let extension = image::guess_format(&bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png");
    // Image refs come from the document; keep them to a single file name.
    let stem = sanitize_relative(image_ref)
        .iter()
        .map(|segment| segment.to_string_lossy())
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        return Err(FigmintError::Config(format!(
            "image reference {image_ref:?} is not usable as a file name"
        )));
    }
    let file_name = format!("{stem}.{extension}");
    let path = dir.join(&file_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|err| FigmintError::filesystem(&path, err))?;
    debug!(image_ref, path = %path.display(), "fill image written");
    Ok(file_name)
}
