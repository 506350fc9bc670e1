//! Part Catalog - Localized names and descriptions for pickable parts
//!
//! The built-in catalog is embedded from `parts.toml`. A replacement
//! catalog (for another language, say) can be loaded from disk in the same
//! format.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const BUILTIN: &str = include_str!("parts.toml");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read part catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse part catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Duplicate part id in catalog: {0}")]
    Duplicate(String),
    #[error("No catalog entry for part: {0}")]
    Missing(String),
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartEntry {
    pub id: String,
    /// Display name (Japanese in the built-in catalog)
    pub name: String,
    pub name_en: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartCatalog {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub part: Vec<PartEntry>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl PartCatalog {
    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN)
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a catalog from a TOML string; ids must be unique
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: PartCatalog = toml::from_str(content)?;
        for (i, entry) in catalog.part.iter().enumerate() {
            if catalog.part[..i].iter().any(|e| e.id == entry.id) {
                return Err(CatalogError::Duplicate(entry.id.clone()));
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Result<&PartEntry, CatalogError> {
        self.part
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| CatalogError::Missing(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.part.len()
    }

    pub fn is_empty(&self) -> bool {
        self.part.is_empty()
    }
}
