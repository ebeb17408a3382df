//! Per-taxon snapshot corpus
//!
//! Loads the precomputed assessed-species snapshot and its companion
//! occurrence table into memory, lazily per taxon, reusing the copy until it
//! goes stale (1 hour by default). A failed load is retried on every
//! subsequent request; it is never cached as a permanent failure. Composite
//! groups merge several files, tagging each species with its source
//! sub-group. A file that fails to parse is treated as absent, never as a
//! partial contribution.

pub mod table;

use crate::registry::TaxonConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

pub use table::OccurrenceRow;

/// One assessed species from the snapshot export; read-only to consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub sis_id: i64,
    pub scientific_name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    /// Red List category code, e.g. "EN"
    pub category: String,
    #[serde(default)]
    pub assessment_id: Option<i64>,
    #[serde(default)]
    pub assessment_date: Option<String>,
    /// Prior-assessment history, newest first
    #[serde(default)]
    pub history: Vec<PriorAssessment>,
    /// Source sub-group id, set when a composite group is merged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A prior assessment reference in a species' history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorAssessment {
    #[serde(default)]
    pub assessment_id: Option<i64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Snapshot export metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub total: u64,
    pub fetched_at: DateTime<Utc>,
    /// Species counts per Red List category
    #[serde(default)]
    pub categories: BTreeMap<String, u64>,
}

/// On-disk snapshot file shape
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    metadata: SnapshotMetadata,
    species: Vec<SnapshotRecord>,
}

/// One occurrence-table row with its derived conservation category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub species_key: i64,
    pub occurrence_count: u64,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub occurrences_since_assessment: Option<u64>,
    /// Category cross-referenced from the snapshot by normalized name;
    /// `None` means the species is not evaluated
    #[serde(default)]
    pub redlist_category: Option<String>,
}

/// Fully loaded, merged corpus for one taxon
#[derive(Debug)]
pub struct TaxonSnapshot {
    pub species: Vec<SnapshotRecord>,
    pub metadata: SnapshotMetadata,
    /// Occurrence table, pre-sorted descending by count by the export
    pub occurrences: Vec<OccurrenceRecord>,
    /// Species keys present in the occurrence table; live-mode validation set
    pub species_keys: HashSet<i64>,
    category_by_name: HashMap<String, String>,
}

impl TaxonSnapshot {
    /// Category for a scientific name, after normalization
    pub fn category_for(&self, scientific_name: &str) -> Option<&str> {
        self.category_by_name
            .get(&normalize_name(scientific_name))
            .map(String::as_str)
    }
}

/// Case-fold and trim a scientific name for cross-referencing
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

struct Cell {
    snapshot: Option<Arc<TaxonSnapshot>>,
    loaded_at: Option<Instant>,
    last_load_failed: bool,
}

/// Lazily-loaded snapshot corpus, shared across requests
///
/// Readers are never blocked on a reload; a stale-but-present copy keeps
/// being served while a refresh happens, and duplicate concurrent reloads
/// only cost wasted work since loads are idempotent.
pub struct SnapshotStore {
    data_dir: PathBuf,
    reload_interval: Duration,
    cells: RwLock<HashMap<String, Cell>>,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>, reload_interval: Duration) -> Self {
        Self {
            data_dir: data_dir.into(),
            reload_interval,
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Get the merged snapshot for a taxon, or `None` if unavailable
    #[tracing::instrument(skip(self, taxon), fields(taxon = %taxon.id))]
    pub fn get(&self, taxon: &TaxonConfig) -> Option<Arc<TaxonSnapshot>> {
        if let Ok(cells) = self.cells.read() {
            if let Some(cell) = cells.get(&taxon.id) {
                let fresh = cell
                    .loaded_at
                    .map(|at| at.elapsed() <= self.reload_interval)
                    .unwrap_or(false);
                if fresh && !cell.last_load_failed {
                    return cell.snapshot.clone();
                }
            }
        }

        self.reload(taxon)
    }

    /// Load the taxon from disk and replace the in-memory copy
    ///
    /// On failure the previous copy (if any) keeps being served and the
    /// failure flag forces a retry on the next request.
    fn reload(&self, taxon: &TaxonConfig) -> Option<Arc<TaxonSnapshot>> {
        let loaded = load_taxon(&self.data_dir, taxon);
        let failed = loaded.is_none();

        let mut cells = self.cells.write().ok()?;
        let cell = cells.entry(taxon.id.clone()).or_insert(Cell {
            snapshot: None,
            loaded_at: None,
            last_load_failed: false,
        });

        match loaded {
            Some(snapshot) => {
                let snapshot = Arc::new(snapshot);
                cell.snapshot = Some(snapshot.clone());
                cell.loaded_at = Some(Instant::now());
                cell.last_load_failed = false;
                Some(snapshot)
            },
            None => {
                tracing::warn!(taxon = %taxon.id, "snapshot load failed, will retry on next request");
                cell.last_load_failed = failed;
                // stale read during refresh is accepted
                cell.snapshot.clone()
            },
        }
    }
}

/// Load and merge all files of a (possibly composite) taxon group
fn load_taxon(data_dir: &Path, taxon: &TaxonConfig) -> Option<TaxonSnapshot> {
    let mut species = Vec::new();
    let mut metadata: Option<SnapshotMetadata> = None;

    for file in &taxon.snapshot_files {
        let path = data_dir.join(file);
        let parsed = match read_snapshot_file(&path) {
            Some(parsed) => parsed,
            None => continue,
        };

        let group = sub_group_id(file);
        species.extend(parsed.species.into_iter().map(|mut record| {
            record.group = Some(group.clone());
            record
        }));

        metadata = Some(match metadata {
            None => parsed.metadata,
            Some(merged) => merge_metadata(merged, parsed.metadata),
        });
    }

    let metadata = metadata?;

    let category_by_name: HashMap<String, String> = species
        .iter()
        .map(|record| (normalize_name(&record.scientific_name), record.category.clone()))
        .collect();

    // A missing or unreadable occurrence table degrades to an empty table,
    // not a failed snapshot.
    let mut occurrences = Vec::new();
    for file in &taxon.occurrence_files {
        let path = data_dir.join(file);
        match std::fs::read_to_string(&path) {
            Ok(text) => occurrences.extend(table::parse_table(&text)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "occurrence table unavailable");
            },
        }
    }

    let occurrences: Vec<OccurrenceRecord> = occurrences
        .into_iter()
        .map(|row| {
            let redlist_category = row
                .scientific_name
                .as_deref()
                .and_then(|name| category_by_name.get(&normalize_name(name)))
                .cloned();
            OccurrenceRecord {
                species_key: row.species_key,
                occurrence_count: row.occurrence_count,
                scientific_name: row.scientific_name,
                common_name: row.common_name,
                occurrences_since_assessment: row.occurrences_since_assessment,
                redlist_category,
            }
        })
        .collect();

    let species_keys = occurrences.iter().map(|r| r.species_key).collect();

    tracing::info!(
        taxon = %taxon.id,
        species = species.len(),
        occurrence_rows = occurrences.len(),
        "snapshot loaded"
    );

    Some(TaxonSnapshot {
        species,
        metadata,
        occurrences,
        species_keys,
        category_by_name,
    })
}

/// Read one snapshot file; any read or parse failure means absent
fn read_snapshot_file(path: &Path) -> Option<SnapshotFile> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot file unreadable");
            return None;
        },
    };

    match serde_json::from_str(&text) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot file unparsable");
            None
        },
    }
}

/// Merge metadata of two sub-groups: totals and per-category counts sum,
/// the newest fetch timestamp wins
fn merge_metadata(mut left: SnapshotMetadata, right: SnapshotMetadata) -> SnapshotMetadata {
    left.total += right.total;
    left.fetched_at = left.fetched_at.max(right.fetched_at);
    for (category, count) in right.categories {
        *left.categories.entry(category).or_insert(0) += count;
    }
    left
}

/// Sub-group id of a snapshot file: its stem
fn sub_group_id(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta(total: u64, year: i32, categories: &[(&str, u64)]) -> SnapshotMetadata {
        SnapshotMetadata {
            total,
            fetched_at: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
            categories: categories
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    #[test]
    fn test_merge_metadata_sums_and_keeps_newest() {
        let merged = merge_metadata(
            meta(10, 2023, &[("EN", 4), ("LC", 6)]),
            meta(5, 2024, &[("EN", 2), ("CR", 3)]),
        );
        assert_eq!(merged.total, 15);
        assert_eq!(merged.fetched_at.format("%Y").to_string(), "2024");
        assert_eq!(merged.categories.get("EN"), Some(&6));
        assert_eq!(merged.categories.get("CR"), Some(&3));
        assert_eq!(merged.categories.get("LC"), Some(&6));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Quercus Robur "), "quercus robur");
    }

    #[test]
    fn test_sub_group_id() {
        assert_eq!(sub_group_id("groups/magnoliopsida.json"), "magnoliopsida");
    }
}
