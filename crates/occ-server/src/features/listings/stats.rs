//! Listing statistics
//!
//! Summary statistics over an occurrence set: totals, median, a fixed-bucket
//! count histogram, and assessed-vs-unassessed sums. The six histogram
//! buckets partition any occurrence set exactly once.

use crate::snapshot::OccurrenceRecord;
use serde::{Deserialize, Serialize};

/// Fixed-bucket histogram of occurrence counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub up_to_1: u64,
    pub up_to_10: u64,
    pub up_to_100: u64,
    pub up_to_1000: u64,
    pub up_to_10000: u64,
    pub over_10000: u64,
}

impl Distribution {
    fn record(&mut self, count: u64) {
        match count {
            0..=1 => self.up_to_1 += 1,
            2..=10 => self.up_to_10 += 1,
            11..=100 => self.up_to_100 += 1,
            101..=1000 => self.up_to_1000 += 1,
            1001..=10000 => self.up_to_10000 += 1,
            _ => self.over_10000 += 1,
        }
    }

    /// Sum of all buckets
    pub fn sum(&self) -> u64 {
        self.up_to_1
            + self.up_to_10
            + self.up_to_100
            + self.up_to_1000
            + self.up_to_10000
            + self.over_10000
    }
}

/// Assessed-vs-unassessed occurrence sums
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlistStats {
    pub assessed: u64,
    pub not_assessed: u64,
    pub assessed_occurrences: u64,
    pub not_assessed_occurrences: u64,
}

/// Summary statistics for a listing response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingStats {
    pub total: u64,
    pub filtered: u64,
    #[serde(rename = "totalOccurrences")]
    pub total_occurrences: u64,
    pub median: u64,
    pub distribution: Distribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redlist: Option<RedlistStats>,
}

impl ListingStats {
    /// Stats for an empty occurrence set
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Statistics over snapshot occurrence records, with redlist sums
pub fn from_records(records: &[OccurrenceRecord], filtered: u64) -> ListingStats {
    let counts: Vec<u64> = records.iter().map(|r| r.occurrence_count).collect();
    let mut stats = from_counts(&counts, filtered);

    let mut redlist = RedlistStats::default();
    for record in records {
        if record.redlist_category.is_some() {
            redlist.assessed += 1;
            redlist.assessed_occurrences += record.occurrence_count;
        } else {
            redlist.not_assessed += 1;
            redlist.not_assessed_occurrences += record.occurrence_count;
        }
    }
    stats.redlist = Some(redlist);

    stats
}

/// Statistics over bare occurrence counts (live mode; no category data)
pub fn from_counts(counts: &[u64], filtered: u64) -> ListingStats {
    let mut distribution = Distribution::default();
    let mut total_occurrences = 0u64;
    for &count in counts {
        distribution.record(count);
        total_occurrences += count;
    }

    ListingStats {
        total: counts.len() as u64,
        filtered,
        total_occurrences,
        median: median(counts),
        distribution,
        redlist: None,
    }
}

/// Element at `floor(n/2)` of the ascending-sorted counts, 0 when empty
fn median(counts: &[u64]) -> u64 {
    if counts.is_empty() {
        return 0;
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(count: u64, category: Option<&str>) -> OccurrenceRecord {
        OccurrenceRecord {
            species_key: 1,
            occurrence_count: count,
            scientific_name: None,
            common_name: None,
            occurrences_since_assessment: None,
            redlist_category: category.map(String::from),
        }
    }

    #[test]
    fn test_histogram_partitions_exactly() {
        let counts = [0, 1, 2, 10, 11, 100, 101, 1000, 1001, 10000, 10001, 50000];
        let stats = from_counts(&counts, 0);
        assert_eq!(stats.distribution.sum(), counts.len() as u64);
        assert_eq!(stats.distribution.up_to_1, 2);
        assert_eq!(stats.distribution.up_to_10, 2);
        assert_eq!(stats.distribution.up_to_100, 2);
        assert_eq!(stats.distribution.up_to_1000, 2);
        assert_eq!(stats.distribution.up_to_10000, 2);
        assert_eq!(stats.distribution.over_10000, 2);
    }

    #[test]
    fn test_median_is_floor_midpoint_of_sorted() {
        assert_eq!(median(&[5, 1, 9]), 5);
        // even length takes the upper of the two middle elements
        assert_eq!(median(&[4, 1, 9, 5]), 5);
        assert_eq!(median(&[7]), 7);
    }

    #[test]
    fn test_median_empty_is_zero() {
        assert_eq!(median(&[]), 0);
        assert_eq!(from_counts(&[], 0).median, 0);
    }

    #[test]
    fn test_redlist_sums() {
        let records = vec![
            record(10, Some("EN")),
            record(20, Some("LC")),
            record(5, None),
        ];
        let stats = from_records(&records, 3);
        let redlist = stats.redlist.unwrap();
        assert_eq!(redlist.assessed, 2);
        assert_eq!(redlist.not_assessed, 1);
        assert_eq!(redlist.assessed_occurrences, 30);
        assert_eq!(redlist.not_assessed_occurrences, 5);
        assert_eq!(stats.total_occurrences, 35);
    }

    #[test]
    fn test_counts_only_stats_have_no_redlist() {
        let stats = from_counts(&[1, 2, 3], 3);
        assert!(stats.redlist.is_none());
        assert_eq!(stats.total, 3);
    }
}
