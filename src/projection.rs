//! Grouping of resolved styles by what they mean to a consumer.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::figma::{Color, Effect, Paint, PaintKind, StyleType, TypeStyle};
use crate::names::camel_case;
use crate::styles::{ResolvedStyle, ResolvedStyles, StylePayload};

/// Styles keyed by camel-cased name, per category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProjection {
    pub colors: IndexMap<String, Color>,
    pub gradients: IndexMap<String, Paint>,
    pub image_fills: IndexMap<String, String>,
    pub text_styles: IndexMap<String, TypeStyle>,
    pub effect_styles: IndexMap<String, Vec<Effect>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectionCategory {
    Colors,
    Gradients,
    ImageFills,
    TextStyles,
    EffectStyles,
}

/// Two styles normalized to the same name; `kept` overwrote `replaced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameCollision {
    pub category: ProjectionCategory,
    pub name: String,
    pub replaced: String,
    pub kept: String,
}

#[derive(Default)]
struct Projector {
    out: StyleProjection,
    owners: IndexMap<(ProjectionCategory, String), String>,
    collisions: Vec<NameCollision>,
}

impl Projector {
    /// Record that `key` owns `name` in `category`, noting a collision when a
    /// different style got there first. The caller then overwrites.
    fn claim(&mut self, category: ProjectionCategory, name: &str, key: &str) {
        let previous = self
            .owners
            .insert((category, name.to_string()), key.to_string());
        if let Some(previous) = previous.filter(|previous| previous != key) {
            warn!(?category, name, replaced = %previous, kept = key, "style name collision");
            self.collisions.push(NameCollision {
                category,
                name: name.to_string(),
                replaced: previous,
                kept: key.to_string(),
            });
        }
    }

    fn add(&mut self, style: &ResolvedStyle) {
        let name = Some(camel_case(&style.name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| style.key.clone());

        match (style.style_type, &style.payload) {
            (StyleType::Fill, Some(payload)) => {
                for paint in payload.paints().unwrap_or_default() {
                    match paint.kind {
                        PaintKind::Solid => {
                            if let Some(color) = paint.color {
                                self.claim(ProjectionCategory::Colors, &name, &style.key);
                                self.out.colors.insert(name.clone(), color);
                            }
                        }
                        kind if kind.is_gradient() => {
                            self.claim(ProjectionCategory::Gradients, &name, &style.key);
                            self.out.gradients.insert(name.clone(), paint.clone());
                        }
                        PaintKind::Image => {
                            if let Some(file_name) = &style.file_name {
                                self.claim(ProjectionCategory::ImageFills, &name, &style.key);
                                self.out.image_fills.insert(name.clone(), file_name.clone());
                            }
                        }
                        _ => {}
                    }
                }
            }
            (StyleType::Text, Some(StylePayload::Text(text))) => {
                self.claim(ProjectionCategory::TextStyles, &name, &style.key);
                self.out.text_styles.insert(name, text.clone());
            }
            (StyleType::Effect, Some(StylePayload::Effect(effects))) => {
                self.claim(ProjectionCategory::EffectStyles, &name, &style.key);
                self.out.effect_styles.insert(name, effects.clone());
            }
            _ => {}
        }
    }
}

/// Project resolved styles into categorized maps. Pure.
///
/// When two styles share a normalized name the later one wins; each such
/// overwrite is returned as a [`NameCollision`].
pub fn project(styles: &ResolvedStyles) -> (StyleProjection, Vec<NameCollision>) {
    let mut projector = Projector::default();
    for style in styles.values() {
        projector.add(style);
    }
    (projector.out, projector.collisions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::StyleCategory;
    use serde_json::json;

    fn style(key: &str, name: &str, style_type: StyleType, payload: serde_json::Value) -> ResolvedStyle {
        let payload = match style_type {
            StyleType::Text => StylePayload::Text(serde_json::from_value(payload).expect("text")),
            StyleType::Effect => {
                StylePayload::Effect(serde_json::from_value(payload).expect("effects"))
            }
            _ => StylePayload::Fill(serde_json::from_value(payload).expect("paints")),
        };
        ResolvedStyle {
            key: key.to_string(),
            name: name.to_string(),
            style_type,
            description: None,
            category: StyleCategory::Fill,
            payload: Some(payload),
            file_name: None,
        }
    }

    fn resolved(list: Vec<ResolvedStyle>) -> ResolvedStyles {
        list.into_iter().map(|s| (s.key.clone(), s)).collect()
    }

    #[test]
    fn dispatches_fill_paints_by_kind() {
        let mut hero = style(
            "S:img",
            "Hero Image",
            StyleType::Fill,
            json!([{"type": "IMAGE", "imageRef": "abc"}]),
        );
        hero.file_name = Some("abc.png".to_string());

        let styles = resolved(vec![
            style(
                "S:1",
                "Primary / Blue",
                StyleType::Fill,
                json!([{"type": "SOLID", "color": {"r": 0, "g": 0, "b": 1, "a": 1}}]),
            ),
            style(
                "S:2",
                "Sunset",
                StyleType::Fill,
                json!([{
                    "type": "GRADIENT_LINEAR",
                    "gradientStops": [
                        {"position": 0, "color": {"r": 1, "g": 0.4, "b": 0, "a": 1}},
                        {"position": 1, "color": {"r": 0.6, "g": 0, "b": 0.4, "a": 1}}
                    ]
                }]),
            ),
            hero,
            style(
                "S:3",
                "Heading / Large",
                StyleType::Text,
                json!({"fontFamily": "Inter", "fontSize": 32}),
            ),
            style(
                "S:4",
                "Shadow",
                StyleType::Effect,
                json!([{"type": "DROP_SHADOW", "radius": 4}]),
            ),
        ]);

        let (projection, collisions) = project(&styles);
        assert!(collisions.is_empty());
        assert_eq!(projection.colors["primaryBlue"].b, 1.0);
        let sunset = serde_json::to_value(&projection.gradients["sunset"]).expect("gradient");
        assert_eq!(sunset["type"], "GRADIENT_LINEAR");
        assert_eq!(sunset["gradientStops"][1]["position"], 1);
        assert_eq!(projection.image_fills["heroImage"], "abc.png");
        assert_eq!(
            projection.text_styles["headingLarge"].font_family.as_deref(),
            Some("Inter")
        );
        assert_eq!(projection.effect_styles["shadow"][0].radius, 4.0);
    }

    #[test]
    fn image_fill_without_file_is_not_projected() {
        let styles = resolved(vec![style(
            "S:img",
            "Missing",
            StyleType::Fill,
            json!([{"type": "IMAGE", "imageRef": "nope"}]),
        )]);
        let (projection, _) = project(&styles);
        assert!(projection.image_fills.is_empty());
    }

    #[test]
    fn name_collision_is_last_wins_and_reported() {
        let styles = resolved(vec![
            style(
                "S:a",
                "Brand Red",
                StyleType::Fill,
                json!([{"type": "SOLID", "color": {"r": 1, "g": 0, "b": 0}}]),
            ),
            style(
                "S:b",
                "brand-red",
                StyleType::Fill,
                json!([{"type": "SOLID", "color": {"r": 0.5, "g": 0, "b": 0}}]),
            ),
        ]);

        let (projection, collisions) = project(&styles);
        assert_eq!(projection.colors["brandRed"].r, 0.5);
        assert_eq!(
            collisions,
            vec![NameCollision {
                category: ProjectionCategory::Colors,
                name: "brandRed".to_string(),
                replaced: "S:a".to_string(),
                kept: "S:b".to_string(),
            }]
        );
    }

    #[test]
    fn several_paints_in_one_style_are_not_collisions() {
        let styles = resolved(vec![style(
            "S:a",
            "Layered",
            StyleType::Fill,
            json!([
                {"type": "SOLID", "color": {"r": 1, "g": 1, "b": 1}},
                {"type": "SOLID", "color": {"r": 0, "g": 0, "b": 0}}
            ]),
        )]);
        let (projection, collisions) = project(&styles);
        assert!(collisions.is_empty());
        assert_eq!(projection.colors["layered"].r, 0.0);
    }

    #[test]
    fn projection_serializes_with_camel_case_categories() {
        let (projection, _) = project(&ResolvedStyles::new());
        let value = serde_json::to_value(&projection).expect("serialize");
        for field in ["colors", "gradients", "imageFills", "textStyles", "effectStyles"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
