//! Short "why this suits you" text for a recommended hairstyle.
//!
//! Resolution order: a shape-specific reason for one of the style's tags,
//! then the entry's own `reason_template`, then the shape's general sentence.

use crate::catalog::HairstyleEntry;
use crate::types::{FaceShape, ParseShapeError};
use serde::Deserialize;
use std::collections::BTreeMap;

const BUILTIN_EXPLANATIONS: &str = include_str!("../data/explanations.toml");

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShapeExplanation {
    pub general: String,
    /// Tag → reason fragment completing "This style ...".
    #[serde(default)]
    pub style_reasons: BTreeMap<String, String>,
}

/// Explanation text per face shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, ShapeExplanation>")]
pub struct Explanations {
    shapes: BTreeMap<FaceShape, ShapeExplanation>,
}

impl TryFrom<BTreeMap<String, ShapeExplanation>> for Explanations {
    type Error = ParseShapeError;

    fn try_from(raw: BTreeMap<String, ShapeExplanation>) -> Result<Self, Self::Error> {
        let shapes = raw
            .into_iter()
            .map(|(key, text)| Ok((key.parse::<FaceShape>()?, text)))
            .collect::<Result<_, ParseShapeError>>()?;
        Ok(Self { shapes })
    }
}

impl Explanations {
    pub fn from_toml_str(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    /// Texts compiled in from `data/explanations.toml`.
    pub fn builtin() -> Result<Self, toml::de::Error> {
        Self::from_toml_str(BUILTIN_EXPLANATIONS)
    }

    pub fn for_shape(&self, shape: FaceShape) -> Option<&ShapeExplanation> {
        self.shapes.get(&shape)
    }

    pub fn reason(&self, entry: &HairstyleEntry, shape: FaceShape) -> String {
        let explanation = self.for_shape(shape);

        if let Some(reasons) = explanation.map(|e| &e.style_reasons) {
            let tagged = entry
                .tags
                .iter()
                .find_map(|tag| reasons.get(&tag.to_lowercase()));
            if let Some(reason) = tagged {
                return format!("This style {reason}.");
            }
        }

        if let Some(template) = &entry.reason_template {
            return template.replace("{shape}", shape.as_str());
        }

        match explanation {
            Some(e) => e.general.clone(),
            None => format!("This style complements your {shape} face shape."),
        }
    }
}
