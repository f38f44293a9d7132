//! Depth-first discovery of style definitions and export declarations.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::figma::{ExportSetting, Node};
use crate::styles::{StyleCategory, StyleDefinition, StyleDefinitions};

/// Page name recorded for nodes outside any page.
pub const NO_PAGE: &str = "undefined";
/// Folder name recorded for nodes directly under a page (or the root).
pub const UNGROUPED: &str = "ungrouped";

/// A node-level request to emit one or more renditions of that node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDeclaration {
    pub id: String,
    pub name: String,
    pub page: String,
    pub folder: String,
    pub settings: Vec<ExportSetting>,
}

pub type ExportDeclarations = IndexMap<String, ExportDeclaration>;

/// Everything one walk of the tree finds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Discovery {
    pub styles: StyleDefinitions,
    pub exports: ExportDeclarations,
}

/// Walk the tree rooted at `root`, parent before children, children in
/// declaration order. The first node referencing a style key defines it.
pub fn walk(root: &Node) -> Discovery {
    let discovery = walk_node(root, None, None, Discovery::default());
    debug!(
        styles = discovery.styles.len(),
        exports = discovery.exports.len(),
        "document walked"
    );
    discovery
}

fn walk_node(node: &Node, page: Option<&str>, parent: Option<&Node>, acc: Discovery) -> Discovery {
    let mut acc = acc;

    if !node.export_settings.is_empty() && !acc.exports.contains_key(&node.id) {
        let folder = match parent {
            Some(parent) if !parent.is_page() => parent.name.clone(),
            _ => UNGROUPED.to_string(),
        };
        acc.exports.insert(
            node.id.clone(),
            ExportDeclaration {
                id: node.id.clone(),
                name: node.name.clone(),
                page: page.unwrap_or(NO_PAGE).to_string(),
                folder,
                settings: node.export_settings.clone(),
            },
        );
    }

    for (category_key, style_key) in &node.styles {
        let Some(category) = StyleCategory::parse(category_key) else {
            trace!(node = %node.id, category = %category_key, "ignoring unknown style category");
            continue;
        };
        if acc.styles.contains_key(style_key) {
            continue;
        }
        acc.styles.insert(
            style_key.clone(),
            StyleDefinition {
                key: style_key.clone(),
                category,
                payload: node.payload_for(category),
            },
        );
    }

    let child_page = if node.is_page() {
        Some(node.name.as_str())
    } else {
        page
    };
    node.children
        .iter()
        .fold(acc, |acc, child| walk_node(child, child_page, Some(node), acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::StylePayload;
    use serde_json::{json, Value};

    fn tree(value: Value) -> Node {
        serde_json::from_value(value).expect("node")
    }

    fn png_at(scale: f64) -> Value {
        json!([{"format": "PNG", "suffix": "", "constraint": {"type": "SCALE", "value": scale}}])
    }

    #[test]
    fn records_page_and_folder_for_exports() {
        let root = tree(json!({
            "id": "0:0", "type": "DOCUMENT", "children": [{
                "id": "0:1", "name": "Home", "type": "CANVAS", "children": [
                    {"id": "1:1", "name": "icon", "type": "VECTOR", "exportSettings": png_at(2.0)},
                    {"id": "1:2", "name": "Header", "type": "FRAME", "children": [
                        {"id": "1:3", "name": "logo", "type": "RECTANGLE", "exportSettings": png_at(1.0)}
                    ]}
                ]
            }, {
                "id": "0:2", "name": "Other", "type": "CANVAS", "children": [
                    {"id": "2:1", "name": "Card", "type": "FRAME", "children": [
                        {"id": "2:2", "name": "Inner", "type": "GROUP", "children": [
                            {"id": "2:3", "name": "deep", "type": "ELLIPSE", "exportSettings": png_at(1.0)}
                        ]}
                    ]}
                ]
            }]
        }));

        let found = walk(&root);
        let icon = &found.exports["1:1"];
        assert_eq!((icon.page.as_str(), icon.folder.as_str()), ("Home", UNGROUPED));
        let logo = &found.exports["1:3"];
        assert_eq!((logo.page.as_str(), logo.folder.as_str()), ("Home", "Header"));
        let deep = &found.exports["2:3"];
        assert_eq!((deep.page.as_str(), deep.folder.as_str()), ("Other", "Inner"));
    }

    #[test]
    fn export_outside_any_page_uses_sentinels() {
        let root = tree(json!({
            "id": "9:9", "name": "Loose", "type": "FRAME", "exportSettings": png_at(1.0)
        }));
        let found = walk(&root);
        let decl = &found.exports["9:9"];
        assert_eq!(decl.page, NO_PAGE);
        assert_eq!(decl.folder, UNGROUPED);
    }

    #[test]
    fn empty_export_settings_are_not_declarations() {
        let root = tree(json!({
            "id": "0:1", "name": "Home", "type": "CANVAS", "children": [
                {"id": "1:1", "name": "plain", "type": "FRAME", "exportSettings": []}
            ]
        }));
        assert!(walk(&root).exports.is_empty());
    }

    #[test]
    fn first_occurrence_of_a_style_key_wins() {
        let root = tree(json!({
            "id": "0:1", "name": "Home", "type": "CANVAS", "children": [
                {"id": "1:1", "name": "A", "type": "FRAME", "children": [
                    {"id": "1:2", "name": "first", "type": "RECTANGLE",
                     "styles": {"fill": "S1"},
                     "fills": [{"type": "SOLID", "color": {"r": 1, "g": 0, "b": 0, "a": 1}}]}
                ]},
                {"id": "2:1", "name": "B", "type": "FRAME", "children": [
                    {"id": "2:2", "name": "second", "type": "RECTANGLE",
                     "styles": {"fill": "S1"},
                     "fills": [{"type": "SOLID", "color": {"r": 0, "g": 0, "b": 1, "a": 1}}]}
                ]}
            ]
        }));

        let found = walk(&root);
        assert_eq!(found.styles.len(), 1);
        let payload = found.styles["S1"].payload.as_ref().expect("payload");
        let paints = payload.paints().expect("paints");
        let color = paints[0].color.expect("color");
        assert_eq!((color.r, color.b), (1.0, 0.0));
    }

    #[test]
    fn parent_is_visited_before_children() {
        let root = tree(json!({
            "id": "1:1", "name": "Frame", "type": "FRAME",
            "styles": {"effect": "S:e"},
            "effects": [{"type": "DROP_SHADOW", "radius": 8}],
            "children": [
                {"id": "1:2", "name": "child", "type": "RECTANGLE",
                 "styles": {"effect": "S:e"},
                 "effects": [{"type": "LAYER_BLUR", "radius": 2}]}
            ]
        }));
        match &walk(&root).styles["S:e"].payload {
            Some(StylePayload::Effect(effects)) => assert_eq!(effects[0].radius, 8.0),
            other => panic!("expected effect payload, got {other:?}"),
        }
    }

    #[test]
    fn missing_payload_field_leaves_definition_empty() {
        let root = tree(json!({
            "id": "1:1", "name": "Label", "type": "TEXT",
            "styles": {"text": "S:t", "grid": "S:g", "mystery": "S:m"}
        }));
        let found = walk(&root);
        assert!(found.styles["S:t"].payload.is_none());
        assert_eq!(found.styles["S:g"].category, StyleCategory::Grid);
        assert!(!found.styles.contains_key("S:m"));
    }

    #[test]
    fn discovery_order_follows_traversal() {
        let root = tree(json!({
            "id": "0:1", "name": "Home", "type": "CANVAS", "children": [
                {"id": "1:1", "name": "a", "type": "RECTANGLE", "styles": {"fill": "S:b"}, "children": [
                    {"id": "1:2", "name": "b", "type": "RECTANGLE", "styles": {"fill": "S:a"}}
                ]},
                {"id": "1:3", "name": "c", "type": "RECTANGLE", "styles": {"fill": "S:c"}}
            ]
        }));
        let found = walk(&root);
        let keys: Vec<&str> = found.styles.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["S:b", "S:a", "S:c"]);
    }
}
