//! Figma document model and the source seam.
//!
//! This module provides:
//! - [`Node`] / [`NodeKind`] - the document tree as a tagged union
//! - [`DesignSource`] - the remote capabilities the pipeline depends on
//! - [`OfflineSource`] - a saved file response replayed from disk
//! - API types for parsing Figma JSON responses

pub mod api_types;
pub mod document;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;


pub use api_types::{
    from_json_str, Color, Effect, EffectKind, ExportConstraint, ExportFormat, ExportSetting, FileResponse,
    ImageExportResponse, ImageFillsResponse, LayoutGrid, Paint, PaintKind, StyleMetadata,
    StyleType, TypeStyle,
};
pub use document::{Node, NodeKind, Paints};
pub use source::{DesignSource, OfflineSource};
