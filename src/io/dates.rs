//! Calendar mapping for day-index labels.
//!
//! Input files carry integer day indices, not dates. A reference anchor ties
//! one index to a calendar date; every other label is mapped by its integer
//! distance from that index. The anchor string format is
//! `"<index>:<YY/MM/DD>"`, e.g. `"1:20/02/15"` (index 1 is 2020-02-15).
//!
//! All functions here are pure; a label that does not parse as an integer is
//! a fatal parse error for the whole run.

use chrono::{Duration, NaiveDate};

use crate::error::AppError;

/// Default reference anchor.
pub const DEFAULT_ANCHOR: &str = "1:20/02/15";

/// A resolved reference anchor: raw index `index` falls on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefAnchor {
    pub index: i64,
    pub date: NaiveDate,
}

impl RefAnchor {
    /// Calendar date for a raw index label.
    pub fn date_for_label(&self, label: &str) -> Result<NaiveDate, AppError> {
        let index = parse_index(label)?;
        Ok(self.date + Duration::days(index - self.index))
    }
}

/// Parse an anchor string `"<index>:<YY/MM/DD>"`.
pub fn parse_anchor(s: &str) -> Result<RefAnchor, AppError> {
    let Some((index_part, date_part)) = s.split_once(':') else {
        return Err(AppError::usage(format!(
            "Invalid anchor '{s}'. Expected \"<index>:<YY/MM/DD>\", e.g. \"1:20/02/15\"."
        )));
    };

    let index = parse_index(index_part)?;
    let date = NaiveDate::parse_from_str(date_part.trim(), "%y/%m/%d").map_err(|_| {
        AppError::usage(format!(
            "Invalid anchor date '{date_part}'. Expected YY/MM/DD, e.g. 20/02/15."
        ))
    })?;

    Ok(RefAnchor { index, date })
}

/// Parse a day-index label as an integer.
pub fn parse_index(label: &str) -> Result<i64, AppError> {
    label
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::usage(format!("Day-index label '{label}' is not an integer.")))
}

/// Map raw index labels to calendar dates via the anchor.
pub fn map_dates(labels: &[String], anchor: &RefAnchor) -> Result<Vec<NaiveDate>, AppError> {
    labels
        .iter()
        .map(|label| anchor.date_for_label(label))
        .collect()
}
