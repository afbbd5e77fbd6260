//! Hairstyle catalog.
//!
//! The catalog is configuration data: loaded once at startup from TOML
//! (a default is compiled in from `data/hairstyles.toml`) and read-only
//! afterwards.

use crate::types::FaceShape;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const BUILTIN_CATALOG: &str = include_str!("../data/hairstyles.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bad catalog TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("hairstyle at position {0} has an empty id")]
    EmptyId(usize),
    #[error("hairstyle id {0:?} appears more than once")]
    DuplicateId(String),
}

/// How hard a style is to achieve and maintain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("unknown difficulty {s:?} (expected easy, medium or hard)")),
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HairstyleEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Explanation fallback; `{shape}` is replaced with the face shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_template: Option<String>,
    #[serde(alias = "suitable_face_shapes")]
    pub suitable_shapes: BTreeSet<FaceShape>,
    pub popularity: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl HairstyleEntry {
    pub fn suits(&self, shape: FaceShape) -> bool {
        self.suitable_shapes.contains(&shape)
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    hairstyles: Vec<HairstyleEntry>,
}

/// Validated hairstyle catalog with unique, non-empty ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    hairstyles: Vec<HairstyleEntry>,
}

impl Catalog {
    pub fn new(hairstyles: Vec<HairstyleEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (i, entry) in hairstyles.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(i));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { hairstyles })
    }

    pub fn from_toml_str(src: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(src)?;
        Self::new(file.hairstyles)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let src = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&src)?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "hairstyle catalog loaded");
        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn entries(&self) -> &[HairstyleEntry] {
        &self.hairstyles
    }

    pub fn get(&self, id: &str) -> Option<&HairstyleEntry> {
        self.hairstyles.iter().find(|h| h.id == id)
    }

    /// Every shape at least one entry is suitable for.
    pub fn face_shapes(&self) -> BTreeSet<FaceShape> {
        self.hairstyles
            .iter()
            .flat_map(|h| h.suitable_shapes.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.hairstyles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hairstyles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        // Every shape has at least one suggestion
        assert_eq!(catalog.face_shapes().len(), FaceShape::ALL.len());
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = Catalog::builtin().unwrap();
        let bob = catalog.get("hs002").unwrap();
        assert_eq!(bob.name, "Classic Bob");
        assert!(bob.suits(FaceShape::Heart));
        assert!(!bob.suits(FaceShape::Round));
        assert!(catalog.get("nope").is_none());
    }

    #[test]
    fn test_legacy_field_alias() {
        let src = r#"
            [[hairstyles]]
            id = "a"
            name = "A"
            description = "d"
            suitable_face_shapes = ["oval"]
            difficulty = "easy"
            popularity = 1
        "#;
        let catalog = Catalog::from_toml_str(src).unwrap();
        assert!(catalog.entries()[0].suits(FaceShape::Oval));
        assert!(catalog.entries()[0].tags.is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let src = r#"
            [[hairstyles]]
            id = "x"
            name = "One"
            description = ""
            suitable_shapes = ["oval"]
            difficulty = "easy"
            popularity = 1

            [[hairstyles]]
            id = "x"
            name = "Two"
            description = ""
            suitable_shapes = ["round"]
            difficulty = "hard"
            popularity = 2
        "#;
        assert!(matches!(
            Catalog::from_toml_str(src),
            Err(CatalogError::DuplicateId(id)) if id == "x"
        ));
    }

    #[test]
    fn test_unknown_shape_is_parse_error() {
        let src = r#"
            [[hairstyles]]
            id = "x"
            name = "X"
            description = ""
            suitable_shapes = ["triangle"]
            difficulty = "easy"
            popularity = 1
        "#;
        assert!(matches!(Catalog::from_toml_str(src), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_empty_id_rejected() {
        let entry = HairstyleEntry {
            id: " ".into(),
            name: "n".into(),
            description: String::new(),
            reason_template: None,
            suitable_shapes: BTreeSet::new(),
            popularity: 0,
            difficulty: Difficulty::Easy,
            tags: BTreeSet::new(),
            image_url: None,
        };
        assert!(matches!(Catalog::new(vec![entry]), Err(CatalogError::EmptyId(0))));
    }

    #[test]
    fn test_difficulty_order_and_parse() {
        assert!(Difficulty::Easy < Difficulty::Medium && Difficulty::Medium < Difficulty::Hard);
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/hairstyles.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
