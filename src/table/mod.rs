//! Loads the survey sheet and locates its header row.
//!
//! Two hypotheses are tried in order: the first row is the header, or the
//! first row is a title and the header sits one row below it. The first
//! layout whose headers resolve every required key wins.

pub mod reader;

use itertools::Itertools;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::normalization::{ColumnMap, FieldKey};

pub use reader::read_rows;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("spreadsheet not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to open workbook {}: {}", .path.display(), .source)]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },
    #[error("failed to read delimited file {}: {}", .path.display(), .source)]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("sheet too short to parse headers ({rows} row(s))")]
    SheetTooShort { rows: usize },
    #[error(
        "missing required columns after two parsing attempts: [{}]\n\
         Found columns (attempt1): {:?}\n\
         Found columns (attempt2): {:?}",
        .missing.iter().join(", "),
        .attempt1,
        .attempt2
    )]
    MissingColumns {
        missing: Vec<FieldKey>,
        attempt1: Vec<String>,
        attempt2: Vec<String>,
    },
}

/// A sheet whose header row satisfied the required key set.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Index of the header row in the raw sheet (0 or 1).
    pub header_row: usize,
    pub columns: ColumnMap,
}

/// Pick the header row for already-read raw rows.
pub fn locate_header(mut raw: Vec<Vec<String>>) -> Result<LoadedTable, TableError> {
    let attempt1 = raw.first().cloned().unwrap_or_default();
    let columns1 = ColumnMap::resolve(&attempt1);
    if columns1.has_required() {
        let rows = raw.split_off(raw.len().min(1));
        return Ok(LoadedTable {
            headers: attempt1,
            rows,
            header_row: 0,
            columns: columns1,
        });
    }

    let shifted = raw.len().saturating_sub(1);
    if shifted < 2 {
        return Err(TableError::SheetTooShort { rows: raw.len() });
    }

    let attempt2 = raw[1].clone();
    let columns2 = ColumnMap::resolve(&attempt2);
    if columns2.has_required() {
        warn!(
            title_row = ?attempt1,
            "first row is not a header; using the second row"
        );
        let rows = raw.split_off(2);
        return Ok(LoadedTable {
            headers: attempt2,
            rows,
            header_row: 1,
            columns: columns2,
        });
    }

    let missing = FieldKey::REQUIRED
        .iter()
        .copied()
        .filter(|k| !columns1.contains(*k) && !columns2.contains(*k))
        .sorted_by_key(|k| k.as_str())
        .collect();
    Err(TableError::MissingColumns {
        missing,
        attempt1,
        attempt2,
    })
}

/// Read `sheet` from `path` and locate its header row.
pub fn load_table(path: &Path, sheet: &str) -> Result<LoadedTable, TableError> {
    let raw = read_rows(path, sheet)?;
    let table = locate_header(raw)?;
    info!(
        path = %path.display(),
        sheet,
        header_row = table.header_row,
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded survey table"
    );
    Ok(table)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn first_row_header() {
        let table = locate_header(rows(&[
            &["No", "Region", "Governorate", "Lat", "Lon"],
            &["1", "Eastern", "Al Jandal", "31", "35"],
        ]))
        .unwrap();
        assert_eq!(table.header_row, 0);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "1");
    }

    #[test]
    fn header_only_sheet_loads_with_no_rows() {
        let table =
            locate_header(rows(&[&["No", "Region", "Governorate", "Lat", "Lon"]])).unwrap();
        assert!(table.rows.is_empty());
    }

    #[test]
    fn shifted_header_is_recovered() {
        let table = locate_header(rows(&[
            &["SIO field survey 2024", "", ""],
            &["No.", "Region", "Governorate", "Latitude", "Longitude"],
            &["1", "Eastern", "Al Jandal", "31", "35"],
            &["2", "Northern", "Arar", "30.9", "41.0"],
        ]))
        .unwrap();
        assert_eq!(table.header_row, 1);
        assert_eq!(table.headers[0], "No.");
        assert_eq!(table.rows.len(), 2);
        assert!(table.columns.has_required());
    }

    #[test]
    fn too_short_after_shift() {
        let err = locate_header(rows(&[&["title"], &["No", "Region"]])).unwrap_err();
        assert!(matches!(err, TableError::SheetTooShort { rows: 2 }));

        let err = locate_header(Vec::new()).unwrap_err();
        assert!(matches!(err, TableError::SheetTooShort { rows: 0 }));
    }

    #[test]
    fn missing_columns_names_keys_and_both_attempts() {
        let err = locate_header(rows(&[
            &["Survey"],
            &["No", "Region", "Latitude"],
            &["1", "Eastern", "31"],
        ]))
        .unwrap_err();
        match &err {
            TableError::MissingColumns {
                missing,
                attempt1,
                attempt2,
            } => {
                assert_eq!(missing, &vec![FieldKey::Governorate, FieldKey::Longitude]);
                assert_eq!(attempt1, &vec!["Survey".to_string()]);
                assert_eq!(attempt2.len(), 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("[governorate, longitude]"));
        assert!(msg.contains("attempt1): [\"Survey\"]"));
        assert!(msg.contains("attempt2): [\"No\", \"Region\", \"Latitude\"]"));
    }

    #[test]
    fn workbook_header_under_title_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx");
        testing::write_survey_xlsx(&path);

        let table = load_table(&path, "SIO").unwrap();
        assert_eq!(table.header_row, 1);
        assert_eq!(table.headers[2], "المنطقة");
        assert_eq!(table.rows.len(), 3);
        assert!(table.columns.has_required());
        assert_eq!(table.rows[0][0], "1");
    }
}
