//! Input parsing and series building.
//!
//! This module turns a line-oriented count file into the fixed-length
//! `CaseSeries` buffer that the fitter consumes.
//!
//! Design goals:
//! - **Fail fast** on malformed tokens (clear errors + exit code 2)
//! - **Deterministic behavior**: input order is preserved as-is; we do not
//!   deduplicate or sort by label, so an unordered file yields bins in file
//!   order, not true chronology (a documented limitation)
//! - **Separation of concerns**: no fitting logic here
//!
//! Input format: one record per line, whitespace-separated tokens. The first
//! token is a day-index label (integer-as-string), the second a case count.
//! Lines with fewer than two tokens (blank lines, headers) are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::domain::{CaseBin, CaseSeries, FitConfig};
use crate::error::AppError;
use crate::io::dates::{self, RefAnchor};

/// Summary stats about the parsed input.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    /// Records actually placed in the buffer.
    pub n_records: usize,
    /// Bins with a nonzero count (real observations).
    pub n_observed: usize,
    pub max_count: u64,
}

/// Ingest output: the series buffer + resolved anchor + stats.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub series: CaseSeries,
    pub anchor: RefAnchor,
    pub stats: DatasetStats,
    pub lines_read: usize,
}

/// Load a count file and build the series buffer for a run.
pub fn load_series(config: &FitConfig) -> Result<IngestedData, AppError> {
    let anchor = dates::parse_anchor(&config.anchor)?;

    let file = File::open(&config.input).map_err(|e| {
        AppError::usage(format!(
            "Failed to open input '{}': {e}",
            config.input.display()
        ))
    })?;

    let (records, lines_read) = parse_records(BufReader::new(file))?;
    let series = build_series(&records, &anchor, config.bins)?;
    let stats = compute_stats(&series, records.len().min(config.bins));

    Ok(IngestedData {
        series,
        anchor,
        stats,
        lines_read,
    })
}

/// Parse `(label, count)` records from line-oriented input.
///
/// Lines with fewer than two tokens are skipped. A count token that does not
/// parse as an unsigned integer aborts the run.
pub fn parse_records<R: BufRead>(reader: R) -> Result<(Vec<(String, u64)>, usize), AppError> {
    let mut records = Vec::new();
    let mut lines_read = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        lines_read += 1;

        let line = line.map_err(|e| AppError::usage(format!("Failed to read line {line_no}: {e}")))?;
        let mut tokens = line.split_whitespace();

        let (Some(label), Some(count)) = (tokens.next(), tokens.next()) else {
            continue;
        };

        let count = count.parse::<u64>().map_err(|_| {
            AppError::usage(format!(
                "Line {line_no}: count token '{count}' is not a non-negative integer."
            ))
        })?;

        records.push((label.to_string(), count));
    }

    Ok((records, lines_read))
}

/// Build the fixed-length series buffer from parsed records.
///
/// - Records beyond `bins` are dropped (the buffer is a fixed window).
/// - If fewer than `bins` records exist, labels continue from the last
///   observed label in steps of one, with count 0 (unobserved placeholder).
/// - `uncertainty = sqrt(count)`, so zero-count placeholders get zero.
pub fn build_series(
    records: &[(String, u64)],
    anchor: &RefAnchor,
    bins: usize,
) -> Result<CaseSeries, AppError> {
    if records.is_empty() {
        return Err(AppError::data(
            "Input contains no records (need at least one \"<label> <count>\" line).",
        ));
    }
    if bins == 0 {
        return Err(AppError::usage("Bin count must be > 0."));
    }

    let used = records.len().min(bins);
    let mut labels: Vec<String> = Vec::with_capacity(bins);
    let mut counts: Vec<u64> = Vec::with_capacity(bins);
    for (label, count) in &records[..used] {
        labels.push(label.clone());
        counts.push(*count);
    }

    // Extend past the observed range: continue labels from the last one.
    let last_label = dates::parse_index(&labels[used - 1])?;
    for step in 1..=(bins - used) {
        labels.push((last_label + step as i64).to_string());
        counts.push(0);
    }

    // Calendar dates come from the anchor; this also validates every label.
    let date_list = dates::map_dates(&labels, anchor)?;

    let bins_out: Vec<CaseBin> = counts
        .iter()
        .zip(date_list)
        .enumerate()
        .map(|(i, (&count, date))| CaseBin {
            index: (i + 1) as u32,
            date,
            count,
            uncertainty: (count as f64).sqrt(),
        })
        .collect();

    Ok(CaseSeries { bins: bins_out })
}

fn compute_stats(series: &CaseSeries, n_records: usize) -> DatasetStats {
    DatasetStats {
        n_records,
        n_observed: series.observed_days(),
        max_count: series.max_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn anchor() -> RefAnchor {
        dates::parse_anchor("1:20/02/15").unwrap()
    }

    #[test]
    fn short_lines_are_ignored() {
        let input = "header\n\n1 10\n2 15\n3 22\n";
        let (records, lines_read) = parse_records(Cursor::new(input)).unwrap();
        assert_eq!(lines_read, 5);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], ("1".to_string(), 10));
    }

    #[test]
    fn bad_count_token_fails_fast() {
        let err = parse_records(Cursor::new("1 ten\n")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn series_is_zero_padded_to_full_length() {
        let records = vec![
            ("1".to_string(), 10),
            ("2".to_string(), 15),
            ("3".to_string(), 22),
        ];
        let series = build_series(&records, &anchor(), 100).unwrap();

        assert_eq!(series.len(), 100);
        for (i, bin) in series.bins.iter().enumerate() {
            assert_eq!(bin.index, (i + 1) as u32);
        }

        assert_eq!(series.bins[0].count, 10);
        assert!((series.bins[0].uncertainty - (10f64).sqrt()).abs() < 1e-12);

        // Bin 4 continues the label sequence: index 4, count 0, zero uncertainty.
        let pad = &series.bins[3];
        assert_eq!(pad.count, 0);
        assert_eq!(pad.uncertainty, 0.0);
        assert_eq!(pad.date_label(), "20-02-18");

        let last = &series.bins[99];
        assert_eq!(last.count, 0);
        assert_eq!(last.date_label(), "20-05-24");
    }

    #[test]
    fn uncertainty_is_sqrt_of_count_everywhere() {
        let records: Vec<(String, u64)> =
            (1..=40).map(|i| (i.to_string(), i * i)).collect();
        let series = build_series(&records, &anchor(), 100).unwrap();
        for bin in &series.bins {
            assert!((bin.uncertainty - (bin.count as f64).sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    fn excess_records_are_dropped() {
        let records: Vec<(String, u64)> = (1..=30).map(|i| (i.to_string(), 5)).collect();
        let series = build_series(&records, &anchor(), 10).unwrap();
        assert_eq!(series.len(), 10);
        assert!(series.bins.iter().all(|b| b.count == 5));
    }

    #[test]
    fn empty_input_is_a_data_error() {
        let err = build_series(&[], &anchor(), 100).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn labels_starting_past_one_extend_correctly() {
        let records = vec![("7".to_string(), 3), ("8".to_string(), 4)];
        let series = build_series(&records, &anchor(), 4).unwrap();
        // Padding continues 9, 10; dates follow the label arithmetic.
        assert_eq!(series.bins[2].date, anchor().date_for_label("9").unwrap());
        assert_eq!(series.bins[3].date, anchor().date_for_label("10").unwrap());
    }
}
