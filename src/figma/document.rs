//! The Figma document tree.
//!
//! Nodes are decoded from raw JSON values one level at a time and classified
//! by their `type` tag, so every [`NodeKind`] variant only carries the style
//! fields that are valid for it. Fields with an unexpected shape are dropped
//! instead of failing the whole document.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use super::api_types::{Effect, ExportSetting, LayoutGrid, Paint, TypeStyle};
use crate::styles::{StyleCategory, StylePayload};

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub children: Vec<Node>,
    /// Style category (as written by Figma, e.g. `fill`) to style key.
    pub styles: IndexMap<String, String>,
    pub export_settings: Vec<ExportSetting>,
    pub kind: NodeKind,
}

/// Style-bearing fields shared by frames, shapes and text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paints {
    pub fills: Option<Vec<Paint>>,
    pub strokes: Option<Vec<Paint>>,
    pub effects: Option<Vec<Effect>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    /// A page.
    Canvas {
        background: Option<Vec<Paint>>,
    },
    /// FRAME, GROUP, COMPONENT, COMPONENT_SET, INSTANCE, SECTION.
    Container {
        paints: Paints,
        layout_grids: Option<Vec<LayoutGrid>>,
        background: Option<Vec<Paint>>,
    },
    /// RECTANGLE, ELLIPSE, VECTOR, STAR, LINE, REGULAR_POLYGON, BOOLEAN_OPERATION.
    Shape { paints: Paints },
    Text {
        paints: Paints,
        style: Option<TypeStyle>,
    },
    Other(String),
}

impl Node {
    pub fn is_page(&self) -> bool {
        matches!(self.kind, NodeKind::Canvas { .. })
    }

    /// Extract the payload a style of `category` takes from this node, if the
    /// node kind carries that field.
    pub fn payload_for(&self, category: StyleCategory) -> Option<StylePayload> {
        match (category, &self.kind) {
            (StyleCategory::Text, NodeKind::Text { style, .. }) => {
                style.clone().map(StylePayload::Text)
            }
            (StyleCategory::Grid, NodeKind::Container { layout_grids, .. }) => {
                layout_grids.clone().map(StylePayload::Grid)
            }
            (StyleCategory::Background, NodeKind::Canvas { background })
            | (StyleCategory::Background, NodeKind::Container { background, .. }) => {
                background.clone().map(StylePayload::Background)
            }
            (StyleCategory::Stroke, NodeKind::Container { paints, .. })
            | (StyleCategory::Stroke, NodeKind::Shape { paints })
            | (StyleCategory::Stroke, NodeKind::Text { paints, .. }) => {
                paints.strokes.clone().map(StylePayload::Stroke)
            }
            (StyleCategory::Fill, NodeKind::Container { paints, .. })
            | (StyleCategory::Fill, NodeKind::Shape { paints })
            | (StyleCategory::Fill, NodeKind::Text { paints, .. }) => {
                paints.fills.clone().map(StylePayload::Fill)
            }
            (StyleCategory::Effect, NodeKind::Container { paints, .. })
            | (StyleCategory::Effect, NodeKind::Shape { paints })
            | (StyleCategory::Effect, NodeKind::Text { paints, .. }) => {
                paints.effects.clone().map(StylePayload::Effect)
            }
            (_, NodeKind::Document)
            | (_, NodeKind::Other(_))
            | (StyleCategory::Text, _)
            | (StyleCategory::Grid, _)
            | (StyleCategory::Background, _)
            | (_, NodeKind::Canvas { .. }) => None,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Node::from_value)
    }
}

impl Node {
    /// Build a node tree from raw JSON. Never fails: a non-object child is
    /// skipped, and a field with an unexpected shape is treated as absent.
    ///
    /// Children are assembled with an explicit stack, so nesting depth is
    /// bounded by the heap rather than the call stack.
    pub fn from_value(value: Value) -> Node {
        let (mut node, children) = shallow(value).unwrap_or_else(|| (Node::empty(), Vec::new()));
        let mut pending = children.into_iter();
        let mut ancestors: Vec<(Node, std::vec::IntoIter<Value>)> = Vec::new();

        loop {
            match pending.next() {
                Some(child) => match shallow(child) {
                    Some((child_node, grandchildren)) => {
                        ancestors.push((node, pending));
                        node = child_node;
                        pending = grandchildren.into_iter();
                    }
                    None => warn!(parent = %node.id, "skipping malformed child node"),
                },
                None => match ancestors.pop() {
                    Some((mut parent, rest)) => {
                        parent.children.push(node);
                        node = parent;
                        pending = rest;
                    }
                    None => return node,
                },
            }
        }
    }

    fn empty() -> Node {
        Node {
            id: String::new(),
            name: String::new(),
            children: Vec::new(),
            styles: IndexMap::new(),
            export_settings: Vec::new(),
            kind: NodeKind::Other(String::new()),
        }
    }
}

/// Decode one node without its children, which are handed back raw.
fn shallow(value: Value) -> Option<(Node, Vec<Value>)> {
    let Value::Object(mut map) = value else {
        return None;
    };
    let id = string_field(&mut map, "id");
    let name = string_field(&mut map, "name");
    let node_type = string_field(&mut map, "type");
    let children = match map.remove("children") {
        Some(Value::Array(children)) => children,
        _ => Vec::new(),
    };

    let styles: IndexMap<String, String> = match map.remove("styles") {
        Some(Value::Object(entries)) => entries
            .into_iter()
            .filter_map(|(category, key)| match key {
                Value::String(key) => Some((category, key)),
                _ => None,
            })
            .collect(),
        _ => IndexMap::new(),
    };

    let export_settings = match map.remove("exportSettings") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| lenient::<ExportSetting>(&id, "exportSettings", entry))
            .collect(),
        _ => Vec::new(),
    };

    let kind = match node_type.as_str() {
        "DOCUMENT" => NodeKind::Document,
        "CANVAS" => NodeKind::Canvas {
            background: take(&mut map, &id, "background"),
        },
        "FRAME" | "GROUP" | "COMPONENT" | "COMPONENT_SET" | "INSTANCE" | "SECTION" => {
            NodeKind::Container {
                paints: Paints {
                    fills: take(&mut map, &id, "fills"),
                    strokes: take(&mut map, &id, "strokes"),
                    effects: take(&mut map, &id, "effects"),
                },
                layout_grids: take(&mut map, &id, "layoutGrids"),
                background: take(&mut map, &id, "background"),
            }
        }
        "RECTANGLE" | "ELLIPSE" | "VECTOR" | "STAR" | "LINE" | "REGULAR_POLYGON"
        | "BOOLEAN_OPERATION" => NodeKind::Shape {
            paints: Paints {
                fills: take(&mut map, &id, "fills"),
                strokes: take(&mut map, &id, "strokes"),
                effects: take(&mut map, &id, "effects"),
            },
        },
        "TEXT" => NodeKind::Text {
            paints: Paints {
                fills: take(&mut map, &id, "fills"),
                strokes: take(&mut map, &id, "strokes"),
                effects: take(&mut map, &id, "effects"),
            },
            style: take(&mut map, &id, "style"),
        },
        other => NodeKind::Other(other.to_string()),
    };

    let node = Node {
        id,
        name,
        children: Vec::new(),
        styles,
        export_settings,
        kind,
    };
    Some((node, children))
}

fn take<T: DeserializeOwned>(map: &mut Map<String, Value>, node_id: &str, key: &str) -> Option<T> {
    map.remove(key).and_then(|value| lenient(node_id, key, value))
}

fn string_field(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(value)) => value,
        _ => String::new(),
    }
}

fn lenient<T: DeserializeOwned>(node_id: &str, field: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::debug!(node = node_id, field, %err, "ignoring malformed field");
            None
        }
    }
}
