use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One protected-attribute pairing substituted into the base profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub name: String,
    pub gender: String,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: gender.into(),
        }
    }

    /// Stable label used in reports, e.g. `John (male)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.gender)
    }
}

/// Versioned, validated list of variants. Order is significant and preserved in every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantCatalog {
    version: u32,
    variants: Vec<VariantSpec>,
}

#[derive(Deserialize)]
struct RawCatalog {
    version: u32,
    variants: Vec<VariantSpec>,
}

impl VariantCatalog {
    pub fn new(version: u32, variants: Vec<VariantSpec>) -> Result<Self, CatalogError> {
        if variants.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = BTreeSet::new();
        for (index, variant) in variants.iter().enumerate() {
            if variant.name.trim().is_empty() {
                return Err(CatalogError::BlankField {
                    index,
                    field: "name",
                });
            }
            if variant.gender.trim().is_empty() {
                return Err(CatalogError::BlankField {
                    index,
                    field: "gender",
                });
            }
            if !seen.insert((variant.name.as_str(), variant.gender.as_str())) {
                return Err(CatalogError::Duplicate {
                    label: variant.label(),
                });
            }
        }

        Ok(Self { version, variants })
    }

    /// Name/gender matrix exercised by default.
    pub fn standard() -> Self {
        let variants = [
            ("John", "male"),
            ("Emily", "female"),
            ("Aisha", "female"),
            ("Raj", "male"),
            ("José", "male"),
            ("Mei", "female"),
            ("Alex", "non-binary"),
            ("Taylor", "non-binary"),
        ]
        .into_iter()
        .map(|(name, gender)| VariantSpec::new(name, gender))
        .collect();

        Self {
            version: 1,
            variants,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog =
            serde_json::from_str(raw).map_err(|err| CatalogError::Parse(err.to_string()))?;
        Self::new(raw.version, raw.variants)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn variants(&self) -> &[VariantSpec] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl Default for VariantCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl<'de> Deserialize<'de> for VariantCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawCatalog::deserialize(deserializer)?;
        Self::new(raw.version, raw.variants).map_err(serde::de::Error::custom)
    }
}

/// Rejected variant catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("variant catalog must contain at least one variant")]
    Empty,
    #[error("variant {index} has a blank {field}")]
    BlankField { index: usize, field: &'static str },
    #[error("variant {label} appears more than once")]
    Duplicate { label: String },
    #[error("unable to parse variant catalog: {0}")]
    Parse(String),
    #[error("unable to read variant catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
