//! CSV ingestion
//!
//! Reads the source table into [`RawRecord`]s. Only failures that make the
//! whole file unusable are errors (unreadable file, broken CSV framing, a
//! missing required column). Short rows or odd bytes in a single row are
//! passed through and left for the normalizer to drop.

use super::{normalize, Dataset, NormalizeStats, RawRecord};
use crate::config::{Columns, Config};
use crate::error::IngestError;
use std::io::Read;
use std::path::Path;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Read and normalize a CSV file in one go.
pub fn load<P: AsRef<Path>>(path: P, config: &Config) -> Result<(Dataset, NormalizeStats)> {
    let raw = read_csv(path, &config.columns)?;
    Ok(normalize(raw, config))
}

pub fn read_csv<P: AsRef<Path>>(path: P, columns: &Columns) -> Result<Vec<RawRecord>> {
    read_csv_with(path, columns, |_| {})
}

/// Like [`read_csv`], calling `on_row` with the running row count.
pub fn read_csv_with<P, F>(path: P, columns: &Columns, on_row: F) -> Result<Vec<RawRecord>>
where
    P: AsRef<Path>,
    F: FnMut(u64),
{
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "reading CSV");
    read_from(file, columns, on_row)
}

pub fn read_from<R, F>(reader: R, columns: &Columns, mut on_row: F) -> Result<Vec<RawRecord>>
where
    R: Read,
    F: FnMut(u64),
{
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').to_string())
        .collect();

    for required in columns.required() {
        if !headers.iter().any(|h| h == required) {
            return Err(IngestError::MissingColumn(required.to_string()));
        }
    }

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    while rdr.read_byte_record(&mut record)? {
        let row: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.as_str(), String::from_utf8_lossy(v).into_owned()))
            .collect();
        rows.push(row);
        on_row(rows.len() as u64);
    }

    tracing::debug!(rows = rows.len(), "read CSV rows");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "name,score,scored_by,aired_from,genres,synopsis\n";

    #[test]
    fn test_reads_quoted_genres() {
        let csv = format!(
            "{HEADER}Cowboy Bebop,8.75,900000,1998-04-03,\"Action, Award Winning, Sci-Fi\",\"Space, bounty\"\n"
        );
        let rows = read_from(csv.as_bytes(), &Columns::default(), |_| {}).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("genres"), Some("Action, Award Winning, Sci-Fi"));
        assert_eq!(rows[0].get("synopsis"), Some("Space, bounty"));
    }

    #[test]
    fn test_short_rows_pass_through() {
        let csv = format!("{HEADER}Only Name,8\n");
        let rows = read_from(csv.as_bytes(), &Columns::default(), |_| {}).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("aired_from"), None);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "name,score,aired_from,genres\nA,8,2001,Action\n";
        let err = read_from(csv.as_bytes(), &Columns::default(), |_| {}).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(ref c) if c == "scored_by"));
    }

    #[test]
    fn test_bom_header_accepted() {
        let csv = format!("\u{feff}{HEADER}A,8,10,2001-01-01,Action,\n");
        let rows = read_from(csv.as_bytes(), &Columns::default(), |_| {}).unwrap();
        assert_eq!(rows[0].get("name"), Some("A"));
    }

    #[test]
    fn test_progress_callback_counts_rows() {
        let csv = format!("{HEADER}A,8,10,2001,,\nB,7,10,2002,,\n");
        let mut last = 0;
        read_from(csv.as_bytes(), &Columns::default(), |n| last = n).unwrap();
        assert_eq!(last, 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_csv("/no/such/anime.csv", &Columns::default()).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
