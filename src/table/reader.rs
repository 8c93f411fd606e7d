use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

use super::TableError;

/// Render a workbook cell the way it reads in the sheet.
///
/// Integral floats lose their `.0` so that an id typed as `3` in Excel (and
/// stored as `3.0`) still coerces as an integer.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Read every non-blank row of a workbook sheet or delimited text file.
///
/// `.csv` and `.tsv` go through the `csv` reader and ignore `sheet`; anything
/// else is handed to calamine, which sniffs xlsx/xls/xlsb/ods.
pub fn read_rows(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>, TableError> {
    if !path.is_file() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_delimited(path, b',')?,
        "tsv" => read_delimited(path, b'\t')?,
        _ => read_workbook(path, sheet)?,
    };
    debug!(path = %path.display(), rows = rows.len(), "read raw table");
    Ok(rows)
}

fn read_workbook(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>, TableError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| TableError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(TableError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|source| TableError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|row| !is_blank(row))
        .collect())
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>, TableError> {
    let csv_err = |source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if rows.is_empty() {
            if let Some(first) = row.first_mut() {
                *first = first.trim_start_matches('\u{FEFF}').to_string();
            }
        }
        if !is_blank(&row) {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn integral_floats_render_without_fraction() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(31.25)), "31.25");
        assert_eq!(cell_to_string(&Data::Float(f64::NAN)), "NaN");
        assert_eq!(cell_to_string(&Data::Int(-4)), "-4");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String(" Eastern ".into())), " Eastern ");
    }

    #[test]
    fn reads_csv_and_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.csv");
        fs::write(&path, "\u{FEFF}No,Region\n,\n1,Eastern\n\n2,Western,extra\n").unwrap();

        let rows = read_rows(&path, "ignored").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["No", "Region"]);
        assert_eq!(rows[2], vec!["2", "Western", "extra"]);
    }

    #[test]
    fn reads_named_workbook_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx");
        crate::table::testing::write_survey_xlsx(&path);

        let rows = read_rows(&path, "SIO").unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][0], "SIO field survey 2024");
        assert_eq!(rows[1][1], "Region");
        assert_eq!(rows[2][0], "1");
        assert_eq!(rows[2][4], "39.1");
        assert_eq!(rows[3][5], "41.03");
        assert_eq!(rows[4][4], "");
    }

    #[test]
    fn unknown_sheet_lists_available_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.xlsx");
        crate::table::testing::write_survey_xlsx(&path);

        match read_rows(&path, "Sheet1").unwrap_err() {
            TableError::SheetNotFound { sheet, available } => {
                assert_eq!(sheet, "Sheet1");
                assert_eq!(available, vec!["Cover".to_string(), "SIO".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_rows(&dir.path().join("nope.xlsx"), "SIO").unwrap_err();
        assert!(matches!(err, TableError::NotFound(_)));
    }
}
