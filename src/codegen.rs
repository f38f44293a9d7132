//! Rendering of the generated style files.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::exports::ExportTree;
use crate::figma::{PaintKind, StyleType};
use crate::names::constant_case;
use crate::projection::StyleProjection;
use crate::styles::{ResolvedStyle, ResolvedStyles};

pub const SNAPSHOT_FILE: &str = "styles.json";
pub const SCSS_FILE: &str = "colors.scss";

const HEADER: &str = "// Generated by figmint. Do not edit.";

const TS_TYPES: &str = "\
export type ColorValues = keyof typeof styles.colors;
export type GradientValues = keyof typeof styles.gradients;
export type TextValues = keyof typeof styles.textStyles;
export type EffectValues = keyof typeof styles.effectStyles;
";

/// Resolved styles grouped by style type, plus the export tree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStyles<'a> {
    pub fill_styles: IndexMap<&'a str, &'a ResolvedStyle>,
    pub text_styles: IndexMap<&'a str, &'a ResolvedStyle>,
    pub effect_styles: IndexMap<&'a str, &'a ResolvedStyle>,
    pub grid_styles: IndexMap<&'a str, &'a ResolvedStyle>,
    pub exports: &'a ExportTree,
}

impl<'a> RawStyles<'a> {
    pub fn new(styles: &'a ResolvedStyles, exports: &'a ExportTree) -> Self {
        let mut raw = RawStyles {
            fill_styles: IndexMap::new(),
            text_styles: IndexMap::new(),
            effect_styles: IndexMap::new(),
            grid_styles: IndexMap::new(),
            exports,
        };
        for (key, style) in styles {
            let bucket = match style.style_type {
                StyleType::Fill => &mut raw.fill_styles,
                StyleType::Text => &mut raw.text_styles,
                StyleType::Effect => &mut raw.effect_styles,
                StyleType::Grid => &mut raw.grid_styles,
                StyleType::Unknown => continue,
            };
            bucket.insert(key.as_str(), style);
        }
        raw
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModuleBody<'a> {
    #[serde(flatten)]
    projection: &'a StyleProjection,
    raw: &'a RawStyles<'a>,
}

/// A rendered file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: &'static str,
    pub contents: String,
}

/// The `index.js` / `index.ts` module exposing `styles`.
#[derive(Debug, Clone, Copy)]
pub struct StylesModule {
    pub typescript: bool,
}

impl StylesModule {
    pub fn file_name(&self) -> &'static str {
        if self.typescript {
            "index.ts"
        } else {
            "index.js"
        }
    }

    pub fn render(&self, projection: &StyleProjection, raw: &RawStyles<'_>) -> Result<String> {
        let body = serde_json::to_string_pretty(&ModuleBody { projection, raw })?;
        let mut out = String::with_capacity(body.len() + 256);
        out.push_str(HEADER);
        out.push_str("\n\nconst styles = ");
        out.push_str(&body);
        if self.typescript {
            out.push_str(" as const");
        }
        out.push_str(";\n\n");
        if self.typescript {
            out.push_str(TS_TYPES);
            out.push('\n');
        }
        out.push_str("export default styles;\n");
        Ok(out)
    }
}

/// `$NAME: rgb(...);` per solid fill style, named after the style and in
/// resolution order. The last solid paint of a style is its color.
pub fn render_scss(styles: &ResolvedStyles) -> String {
    let mut variables: IndexMap<String, String> = IndexMap::new();
    for style in styles.values().filter(|s| s.style_type == StyleType::Fill) {
        let Some(color) = style
            .payload
            .as_ref()
            .and_then(|payload| payload.paints())
            .and_then(|paints| {
                paints
                    .iter()
                    .filter(|paint| paint.kind == PaintKind::Solid)
                    .filter_map(|paint| paint.color)
                    .last()
            })
        else {
            continue;
        };
        let variable = constant_case(&style.name);
        if variable.is_empty() {
            warn!(style = %style.key, name = %style.name, "style name has no identifier characters; skipping SCSS variable");
            continue;
        }
        variables.insert(variable, color.to_css());
    }
    variables
        .iter()
        .map(|(variable, css)| format!("${variable}: {css};\n"))
        .collect()
}

pub fn render_snapshot(projection: &StyleProjection) -> Result<String> {
    let mut out = serde_json::to_string_pretty(projection)?;
    out.push('\n');
    Ok(out)
}

/// Every file a sync writes, in write order.
pub fn render_all(
    module: StylesModule,
    projection: &StyleProjection,
    styles: &ResolvedStyles,
    exports: &ExportTree,
) -> Result<Vec<GeneratedFile>> {
    let raw = RawStyles::new(styles, exports);
    Ok(vec![
        GeneratedFile {
            name: module.file_name(),
            contents: module.render(projection, &raw)?,
        },
        GeneratedFile {
            name: SNAPSHOT_FILE,
            contents: render_snapshot(projection)?,
        },
        GeneratedFile {
            name: SCSS_FILE,
            contents: render_scss(styles),
        },
    ])
}
