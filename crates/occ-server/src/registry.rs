//! Taxon configuration registry
//!
//! Maps a taxonomic group identifier to its snapshot file locations and
//! provider classification keys. Loaded once from `taxa.json` in the data
//! directory; immutable afterwards, with an explicit [`TaxonRegistry::load`]
//! available for a fresh handle.

use occ_common::{OccError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for one taxonomic group
///
/// A group may be composite: multiple snapshot files and occurrence tables
/// are merged by the snapshot store, with each species tagged by its source
/// sub-group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonConfig {
    /// Registry identifier, e.g. "plantae"
    pub id: String,
    /// Human-readable name, e.g. "Plants"
    pub name: String,
    /// Snapshot JSON files, relative to the data directory
    pub snapshot_files: Vec<String>,
    /// Occurrence table files, relative to the data directory
    #[serde(default)]
    pub occurrence_files: Vec<String>,
    /// Provider classification keys (GBIF taxon keys) for live queries
    #[serde(default)]
    pub classification_keys: Vec<i64>,
}

/// Registry of configured taxonomic groups
#[derive(Debug, Clone, Default)]
pub struct TaxonRegistry {
    taxa: HashMap<String, TaxonConfig>,
}

impl TaxonRegistry {
    /// Load the registry from `taxa.json` in the data directory
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("taxa.json");
        let text = std::fs::read_to_string(&path).map_err(|e| {
            OccError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let taxa: Vec<TaxonConfig> = serde_json::from_str(&text)
            .map_err(|e| OccError::Config(format!("invalid taxa.json: {}", e)))?;

        tracing::info!(count = taxa.len(), "taxon registry loaded");
        Ok(Self::from_taxa(taxa))
    }

    /// Build a registry from an explicit taxon list
    pub fn from_taxa(taxa: Vec<TaxonConfig>) -> Self {
        Self {
            taxa: taxa.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    /// Resolve a taxon identifier
    pub fn resolve(&self, id: &str) -> Option<&TaxonConfig> {
        self.taxa.get(id)
    }

    /// Identifiers of all configured taxa
    pub fn ids(&self) -> Vec<&str> {
        self.taxa.keys().map(String::as_str).collect()
    }
}
