//! Calendar-aligned temporal windows
//!
//! Splits the "since assessment" range into up to two additive sub-windows
//! matching the provider's year/month range parameters: the remaining months
//! of the assessment year, and the subsequent full years.

/// One occurrence query window in provider range syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    /// Single year `"2015"` or inclusive range `"2016,2025"`
    pub year: String,
    /// Inclusive month range within the year, e.g. `"7,12"`
    pub month: Option<String>,
}

/// Windows covering everything after the assessment date
///
/// With a known month before December, the same-year remainder covers months
/// `(month+1)..=12` of the assessment year. Subsequent full years cover
/// `(year+1)..=current` when non-empty. Both windows absent means nothing
/// has elapsed since the assessment.
pub fn since_windows(
    assessment_year: i32,
    assessment_month: Option<u32>,
    current_year: i32,
) -> Vec<QueryWindow> {
    let mut windows = Vec::new();

    if let Some(month) = assessment_month {
        if (1..12).contains(&month) {
            windows.push(QueryWindow {
                year: assessment_year.to_string(),
                month: Some(format!("{},12", month + 1)),
            });
        }
    }

    let first_full_year = assessment_year + 1;
    if current_year >= first_full_year {
        let year = if current_year == first_full_year {
            first_full_year.to_string()
        } else {
            format!("{},{}", first_full_year, current_year)
        };
        windows.push(QueryWindow { year, month: None });
    }

    windows
}
