//! Change report between the previous `styles.json` snapshot and this run.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

use crate::error::{FigmintError, Result};

const CATEGORIES: [&str; 5] = [
    "colors",
    "gradients",
    "imageFills",
    "textStyles",
    "effectStyles",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    None,
    Minor,
    Major,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryChanges {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<String>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub first_run: bool,
    pub bump: VersionBump,
    /// Only categories with at least one change.
    pub categories: IndexMap<String, CategoryChanges>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Read a previous snapshot. Missing is `None`; unreadable JSON is treated as
/// missing so a corrupted snapshot only costs an all-added report.
pub fn load_snapshot(path: &Path) -> Result<Option<Value>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(FigmintError::filesystem(path, err)),
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable snapshot");
            Ok(None)
        }
    }
}

/// Compare two serialized projections category by category.
pub fn diff(previous: Option<&Value>, current: &Value) -> ChangeSet {
    let empty = Map::new();
    let mut categories = IndexMap::new();

    for category in CATEGORIES {
        let before = previous
            .and_then(|p| p.get(category))
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let after = current
            .get(category)
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let mut changes = CategoryChanges::default();
        for (name, value) in after {
            match before.get(name) {
                None => changes.added.push(name.clone()),
                Some(old) if old != value => changes.updated.push(name.clone()),
                Some(_) => {}
            }
        }
        changes.deleted = before
            .keys()
            .filter(|name| !after.contains_key(*name))
            .cloned()
            .collect();

        if !changes.is_empty() {
            categories.insert(category.to_string(), changes);
        }
    }

    let bump = categories
        .values()
        .map(|c| {
            if !c.deleted.is_empty() {
                VersionBump::Major
            } else if !c.added.is_empty() || !c.updated.is_empty() {
                VersionBump::Minor
            } else {
                VersionBump::None
            }
        })
        .max()
        .unwrap_or(VersionBump::None);

    ChangeSet {
        first_run: previous.is_none(),
        bump,
        categories,
    }
}
