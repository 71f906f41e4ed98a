//! Query assembly: search-scope qualifiers and year ranges.

use crate::error::{IeeeError, Result};
use chrono::{Datelike, Local};
use std::fmt;

/// Earliest publication year accepted on the command line.
pub const MIN_YEAR: i32 = 1900;

/// IEEE Xplore data field that restricts where the query text is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataField {
    FullTextAndMetadata,
    TextOnly,
    PublicationTitle,
    Metadata,
    IeeeTerms,
}

impl DataField {
    /// Label used by IEEE's command search syntax.
    pub fn label(self) -> &'static str {
        match self {
            Self::FullTextAndMetadata => "Full Text & Metadata",
            Self::TextOnly => "Full Text Only",
            Self::PublicationTitle => "Publication Title",
            Self::Metadata => "All Metadata",
            Self::IeeeTerms => "IEEE Terms",
        }
    }
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wrap `query` in the data-field qualifier, e.g. `("All Metadata":optics)`.
pub fn add_data_field(query: &str, field: Option<DataField>) -> String {
    match field {
        Some(field) => format!("(\"{}\":{})", field.label(), query),
        None => query.to_string(),
    }
}

/// Closed range of publication years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Normalize one or two years against the given current year.
    ///
    /// A single year runs up to `current_year`; two years are taken as-is.
    pub fn from_years(years: &[i32], current_year: i32) -> Result<Self> {
        for &year in years {
            validate_year(year, current_year)?;
        }
        match *years {
            [start] => Ok(Self {
                start,
                end: current_year,
            }),
            [start, end] => Ok(Self { start, end }),
            [] => Err(IeeeError::Validation("A year is required".to_string())),
            _ => Err(IeeeError::Validation(
                "Only start and/or finish year are accepted".to_string(),
            )),
        }
    }

    /// [`YearRange::from_years`] against the local calendar.
    pub fn from_years_now(years: &[i32]) -> Result<Self> {
        Self::from_years(years, current_year())
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Current year in local time.
pub fn current_year() -> i32 {
    Local::now().year()
}

fn validate_year(year: i32, current_year: i32) -> Result<()> {
    if !(1000..=9999).contains(&year) {
        return Err(IeeeError::Validation(format!(
            "Year has to be a 4 digit integer, got {}",
            year
        )));
    }
    if year < MIN_YEAR || year > current_year {
        return Err(IeeeError::Validation(format!(
            "Year has to be after {} and before current one, got {}",
            MIN_YEAR, year
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_year_runs_to_current() {
        let range = YearRange::from_years(&[2005], 2024).expect("valid");
        assert_eq!(range, YearRange { start: 2005, end: 2024 });
    }

    #[test]
    fn test_two_years_unchanged() {
        let range = YearRange::from_years(&[1990, 2000], 2024).expect("valid");
        assert_eq!(range, YearRange { start: 1990, end: 2000 });
        assert_eq!(range.to_string(), "1990-2000");
    }

    #[test]
    fn test_rejects_bad_counts_and_values() {
        assert!(YearRange::from_years(&[], 2024).is_err());
        assert!(YearRange::from_years(&[1990, 1995, 2000], 2024).is_err());
        assert!(YearRange::from_years(&[205], 2024).is_err());
        assert!(YearRange::from_years(&[1850], 2024).is_err());
        assert!(YearRange::from_years(&[2030], 2024).is_err());
    }

    #[test]
    fn test_add_data_field() {
        assert_eq!(
            add_data_field("optics AND nano", Some(DataField::Metadata)),
            "(\"All Metadata\":optics AND nano)"
        );
        assert_eq!(
            add_data_field("h264", Some(DataField::FullTextAndMetadata)),
            "(\"Full Text & Metadata\":h264)"
        );
        assert_eq!(add_data_field("h264", None), "h264");
    }
}
