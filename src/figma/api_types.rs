//! Figma API response types for parsing JSON from the Figma REST API.
//!
//! Payload types (paints, text styles, effects, layout grids) keep the fields
//! the pipeline reads as typed members and carry everything else in a
//! flattened `extra` map, so the raw style output stays lossless.

use indexmap::IndexMap;
use palette::Srgba;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use super::document::Node;

/// A Figma file response from the files endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub document: Node,
    #[serde(default)]
    pub styles: IndexMap<String, StyleMetadata>,
}

/// Decode a response body with no nesting limit. Document trees routinely
/// nest deeper than serde_json's default of 128 levels; the stack grows on
/// demand instead.
pub fn from_json_str<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Document-level description of a shared style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMetadata {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub style_type: StyleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Style type as declared in the file's style metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyleType {
    Fill,
    Text,
    Effect,
    Grid,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response from the image fills endpoint (`/v1/files/:key/images`).
#[derive(Debug, Deserialize)]
pub struct ImageFillsResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub meta: ImageFillsMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageFillsMeta {
    #[serde(default)]
    pub images: HashMap<String, String>,
}

/// Response from the images export endpoint. A `null` URL means Figma failed
/// to render that node.
#[derive(Debug, Deserialize)]
pub struct ImageExportResponse {
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
}

/// Supported image export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Pdf,
    Png,
    Jpg,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
        }
    }

    /// Vector formats have no scale axis.
    pub fn is_vector(&self) -> bool {
        matches!(self, ExportFormat::Svg | ExportFormat::Pdf)
    }

    /// Parse a format name case-insensitively (`PNG`, `png`, `jpeg`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "svg" => Some(ExportFormat::Svg),
            "pdf" => Some(ExportFormat::Pdf),
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpg),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One export setting declared on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSetting {
    #[serde(default)]
    pub suffix: String,
    pub format: String,
    #[serde(default)]
    pub constraint: ExportConstraint,
}

impl ExportSetting {
    /// The constraint's value when it is a `SCALE` constraint, otherwise 1.
    pub fn scale(&self) -> f64 {
        if self.constraint.constraint_type.eq_ignore_ascii_case("SCALE") {
            self.constraint.value
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConstraint {
    #[serde(rename = "type")]
    pub constraint_type: String,
    #[serde(default = "default_constraint_value")]
    pub value: f64,
}

impl Default for ExportConstraint {
    fn default() -> Self {
        Self {
            constraint_type: "SCALE".to_string(),
            value: 1.0,
        }
    }
}

fn default_constraint_value() -> f64 {
    1.0
}

/// RGBA color from Figma (0.0-1.0 range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Color {
    fn channels(&self) -> Srgba<u8> {
        Srgba::new(
            self.r.clamp(0.0, 1.0) as f32,
            self.g.clamp(0.0, 1.0) as f32,
            self.b.clamp(0.0, 1.0) as f32,
            self.a.clamp(0.0, 1.0) as f32,
        )
        .into_format::<u8, u8>()
    }

    /// Hex color string, with an alpha byte only when not fully opaque
    /// (e.g., "#ff8000" or "#ff800080").
    pub fn to_hex(&self) -> String {
        let c = self.channels();
        if c.alpha == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", c.red, c.green, c.blue, c.alpha)
        }
    }

    /// CSS color function, `rgb()` when opaque and `rgba()` otherwise.
    pub fn to_css(&self) -> String {
        let c = self.channels();
        if c.alpha == u8::MAX {
            format!("rgb({}, {}, {})", c.red, c.green, c.blue)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                c.red,
                c.green,
                c.blue,
                (self.a.clamp(0.0, 1.0) * 100.0).round() / 100.0
            )
        }
    }
}

/// Kind of a paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintKind {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
    Emoji,
    Video,
    #[serde(other)]
    Other,
}

impl PaintKind {
    pub fn is_gradient(&self) -> bool {
        matches!(
            self,
            PaintKind::GradientLinear
                | PaintKind::GradientRadial
                | PaintKind::GradientAngular
                | PaintKind::GradientDiamond
        )
    }
}

/// A fill/stroke description (solid color, gradient, or image reference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: PaintKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typography style from Figma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height_px: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
    #[serde(other)]
    Other,
}

/// A visual effect such as a shadow or blur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default = "visible")]
    pub visible: bool,
    #[serde(default)]
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn visible() -> bool {
    true
}

/// Layout grid definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGrid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
