//! Occurrence table parsing
//!
//! The per-taxon occurrence table is delimited text produced by the export
//! pipeline. Parsing is positional: the first field is the species key, the
//! second the occurrence count. A header line declares which optional
//! columns follow: scientific name, a quoted common name that may contain
//! embedded separators, and an "observations since assessment" count.

use serde::{Deserialize, Serialize};

/// One row of an occurrence table, before category derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRow {
    pub species_key: i64,
    pub occurrence_count: u64,
    pub scientific_name: Option<String>,
    pub common_name: Option<String>,
    pub occurrences_since_assessment: Option<u64>,
}

/// Column layout declared by the table header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableLayout {
    pub has_scientific_name: bool,
    pub has_common_name: bool,
    pub has_since_count: bool,
}

impl TableLayout {
    /// Derive the layout from the header line
    pub fn from_header(header: &str) -> Self {
        let lower = header.to_lowercase();
        let columns: Vec<&str> = lower.split(',').map(str::trim).collect();
        Self {
            has_scientific_name: columns.iter().any(|c| c.contains("scientific")),
            has_common_name: columns.iter().any(|c| c.contains("common")),
            has_since_count: columns.iter().any(|c| c.contains("since")),
        }
    }
}

/// Parse a full occurrence table, header line included
///
/// Rows that fail positional parsing are skipped with a warning; a bad row
/// never poisons the rest of the table.
pub fn parse_table(text: &str) -> Vec<OccurrenceRow> {
    let mut lines = text.lines();
    let layout = match lines.next() {
        Some(header) => TableLayout::from_header(header),
        None => return Vec::new(),
    };

    let mut rows = Vec::new();
    for (number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line, layout) {
            Some(row) => rows.push(row),
            None => {
                tracing::warn!(line = number + 2, "skipping unparsable occurrence row");
            },
        }
    }
    rows
}

/// Parse one data row according to the header layout
pub fn parse_row(line: &str, layout: TableLayout) -> Option<OccurrenceRow> {
    let fields: Vec<&str> = line.split(',').collect();

    let species_key: i64 = fields.first()?.trim().parse().ok()?;
    let occurrence_count: u64 = fields.get(1)?.trim().parse().ok()?;

    let mut scientific_name = None;
    let mut common_name = None;
    let mut since = None;

    let mut rest_start = 2;
    if layout.has_scientific_name {
        scientific_name = fields
            .get(2)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        rest_start = 3;
    }

    let mut rest: &[&str] = fields.get(rest_start..).unwrap_or(&[]);

    // The since-assessment count is the trailing field when declared. A row
    // may omit it; a non-numeric tail is part of the quoted common-name
    // remainder and stays put.
    if layout.has_since_count {
        if let Some((last, head)) = rest.split_last() {
            if let Ok(count) = last.trim().parse() {
                since = Some(count);
                rest = head;
            }
        }
    }

    // The quoted common name may contain embedded separators; everything
    // between the scientific name and the trailing count belongs to it.
    // Re-join and strip a single layer of quoting.
    if layout.has_common_name && !rest.is_empty() {
        let joined = rest.join(",");
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            common_name = Some(strip_quotes(trimmed).to_string());
        }
    }

    Some(OccurrenceRow {
        species_key,
        occurrence_count,
        scientific_name,
        common_name,
        occurrences_since_assessment: since,
    })
}

/// Strip one layer of surrounding double quotes
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HEADER: &str =
        "species_key,occurrence_count,scientific_name,common_name,occurrences_since_assessment";

    #[test]
    fn test_full_row() {
        let table = format!("{}\n12345,678,Quercus robur,\"English Oak\",42", FULL_HEADER);
        let rows = parse_table(&table);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.species_key, 12345);
        assert_eq!(row.occurrence_count, 678);
        assert_eq!(row.scientific_name.as_deref(), Some("Quercus robur"));
        assert_eq!(row.common_name.as_deref(), Some("English Oak"));
        assert_eq!(row.occurrences_since_assessment, Some(42));
    }

    #[test]
    fn test_common_name_with_embedded_separators() {
        let table = format!(
            "{}\n5,10,Panthera pardus,\"Leopard, Common Leopard, Panther\",3",
            FULL_HEADER
        );
        let rows = parse_table(&table);
        assert_eq!(
            rows[0].common_name.as_deref(),
            Some("Leopard, Common Leopard, Panther")
        );
        assert_eq!(rows[0].occurrences_since_assessment, Some(3));
    }

    #[test]
    fn test_header_without_scientific_name_column() {
        // Every row's name and derived category must stay empty, without
        // raising an error.
        let table = "species_key,occurrence_count\n1,100\n2,200";
        let rows = parse_table(table);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row.scientific_name.is_none());
            assert!(row.common_name.is_none());
            assert!(row.occurrences_since_assessment.is_none());
        }
    }

    #[test]
    fn test_name_without_since_column() {
        let table = "species_key,occurrence_count,scientific_name\n9,55,Ficus lutea";
        let rows = parse_table(table);
        assert_eq!(rows[0].scientific_name.as_deref(), Some("Ficus lutea"));
        assert!(rows[0].occurrences_since_assessment.is_none());
    }

    #[test]
    fn test_embedded_separators_without_since_count() {
        // The since column is declared but this row omits it; the quoted
        // tail belongs to the common name, not the count.
        let table = format!(
            "{}\n5,10,Panthera pardus,\"Leopard, Common Leopard\"",
            FULL_HEADER
        );
        let rows = parse_table(&table);
        assert_eq!(
            rows[0].common_name.as_deref(),
            Some("Leopard, Common Leopard")
        );
        assert!(rows[0].occurrences_since_assessment.is_none());
    }

    #[test]
    fn test_missing_optional_fields_in_row() {
        let table = format!("{}\n7,12", FULL_HEADER);
        let rows = parse_table(&table);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].scientific_name.is_none());
        assert!(rows[0].common_name.is_none());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let table = format!("{}\nnot-a-key,5,X\n3,not-a-count\n4,44,Abies alba", FULL_HEADER);
        let rows = parse_table(&table);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].species_key, 4);
    }

    #[test]
    fn test_empty_table() {
        assert!(parse_table("").is_empty());
        assert!(parse_table(FULL_HEADER).is_empty());
    }
}
