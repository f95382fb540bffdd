//! Tabular output store.
//!
//! The pipeline publishes into named sheets of scalar cells; this module
//! defines that boundary and a CSV-directory implementation (one CSV
//! file per sheet) for local runs.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sheet \"{0}\" not found")]
    SheetNotFound(String),

    #[error("invalid cell reference \"{0}\"")]
    BadCellRef(String),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// A scalar cell. `Empty` renders as an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Int(i64),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// A named-sheet store: ordered header plus ordered rows of scalar
/// cells, with in-place updates by A1-style address.
pub trait TabularStore {
    /// Creates the sheet, replacing any previous content
    /// (delete-then-create semantics).
    fn replace_sheet(
        &mut self,
        name: &str,
        header: &[&str],
        rows: &[Vec<CellValue>],
    ) -> Result<(), StoreError>;

    /// Sets one cell by A1-style reference, extending the sheet as
    /// needed.
    fn update_cell(&mut self, name: &str, cell_ref: &str, value: CellValue)
        -> Result<(), StoreError>;

    /// Overwrites a column slice starting at `start_row` (zero-based,
    /// header is row 0).
    fn update_column(
        &mut self,
        name: &str,
        column: usize,
        start_row: usize,
        values: &[CellValue],
    ) -> Result<(), StoreError>;

    fn rename_sheet(&mut self, from: &str, to: &str) -> Result<(), StoreError>;

    /// Removes a sheet; removing an absent sheet is not an error.
    fn delete_sheet(&mut self, name: &str) -> Result<(), StoreError>;

    fn list_sheets(&self) -> Result<Vec<String>, StoreError>;

    /// Every row of the sheet (header included) as strings.
    fn read_sheet(&self, name: &str) -> Result<Vec<Vec<String>>, StoreError>;
}

/// Parses an A1-style reference like `L1` into zero-based
/// `(row, column)`.
///
/// # Errors
///
/// Returns [`StoreError::BadCellRef`] unless the reference is letters
/// followed by a 1-based row number.
pub fn parse_cell_ref(cell_ref: &str) -> Result<(usize, usize), StoreError> {
    let letters: String = cell_ref
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    let digits = &cell_ref[letters.len()..];
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StoreError::BadCellRef(cell_ref.to_string()));
    }

    let mut column: usize = 0;
    for c in letters.chars() {
        let value = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
        column = column * 26 + value;
    }
    let row: usize = digits
        .parse()
        .map_err(|_| StoreError::BadCellRef(cell_ref.to_string()))?;
    if row == 0 {
        return Err(StoreError::BadCellRef(cell_ref.to_string()));
    }
    Ok((row - 1, column - 1))
}

/// One CSV file per sheet under an output directory.
pub struct CsvDirStore {
    dir: PathBuf,
}

impl CsvDirStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        // Sheet names round-trip through list_sheets, so only path
        // separators are replaced.
        let file_name: String = name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        self.dir.join(format!("{file_name}.csv"))
    }

    fn read_rows(&self, name: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let path = self.sheet_path(name);
        if !path.exists() {
            return Err(StoreError::SheetNotFound(name.to_string()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| csv_error(&path, e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(&path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn write_rows(&self, name: &str, rows: &[Vec<String>]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.sheet_path(name);
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| csv_error(&path, e))?;
        for row in rows {
            writer.write_record(row).map_err(|e| csv_error(&path, e))?;
        }
        writer
            .flush()
            .map_err(|e| io_error(&path, e))?;
        Ok(())
    }
}

impl TabularStore for CsvDirStore {
    fn replace_sheet(
        &mut self,
        name: &str,
        header: &[&str],
        rows: &[Vec<CellValue>],
    ) -> Result<(), StoreError> {
        self.delete_sheet(name)?;
        let mut all_rows: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        all_rows.push(header.iter().map(|h| (*h).to_string()).collect());
        for row in rows {
            all_rows.push(row.iter().map(ToString::to_string).collect());
        }
        self.write_rows(name, &all_rows)
    }

    fn update_cell(
        &mut self,
        name: &str,
        cell_ref: &str,
        value: CellValue,
    ) -> Result<(), StoreError> {
        let (row, column) = parse_cell_ref(cell_ref)?;
        let mut rows = self.read_rows(name)?;
        while rows.len() <= row {
            rows.push(Vec::new());
        }
        let target = &mut rows[row];
        while target.len() <= column {
            target.push(String::new());
        }
        target[column] = value.to_string();
        self.write_rows(name, &rows)
    }

    fn update_column(
        &mut self,
        name: &str,
        column: usize,
        start_row: usize,
        values: &[CellValue],
    ) -> Result<(), StoreError> {
        let mut rows = self.read_rows(name)?;
        for (i, value) in values.iter().enumerate() {
            let row = start_row + i;
            while rows.len() <= row {
                rows.push(Vec::new());
            }
            let target = &mut rows[row];
            while target.len() <= column {
                target.push(String::new());
            }
            target[column] = value.to_string();
        }
        self.write_rows(name, &rows)
    }

    fn rename_sheet(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        let from_path = self.sheet_path(from);
        if !from_path.exists() {
            return Err(StoreError::SheetNotFound(from.to_string()));
        }
        let to_path = self.sheet_path(to);
        std::fs::rename(&from_path, &to_path).map_err(|e| io_error(&from_path, e))
    }

    fn delete_sheet(&mut self, name: &str) -> Result<(), StoreError> {
        let path = self.sheet_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn list_sheets(&self) -> Result<Vec<String>, StoreError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error(&self.dir, e))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(name) = file_name.strip_suffix(".csv") {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_sheet(&self, name: &str) -> Result<Vec<Vec<String>>, StoreError> {
        self.read_rows(name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, CsvDirStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CsvDirStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn parse_cell_ref_accepts_a1_style_references() {
        assert_eq!(parse_cell_ref("A1").unwrap(), (0, 0));
        assert_eq!(parse_cell_ref("L1").unwrap(), (0, 11));
        assert_eq!(parse_cell_ref("B10").unwrap(), (9, 1));
        assert_eq!(parse_cell_ref("AA3").unwrap(), (2, 26));
    }

    #[test]
    fn parse_cell_ref_rejects_malformed_references() {
        for bad in ["", "1A", "A", "12", "A0", "A1B"] {
            assert!(
                matches!(parse_cell_ref(bad), Err(StoreError::BadCellRef(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn replace_then_read_round_trips() {
        let (_dir, mut store) = store();
        store
            .replace_sheet(
                "Rex Delivery - Summary",
                &["Root", "Avg_distance_km"],
                &[
                    vec![CellValue::from("03100"), CellValue::Number(4.25)],
                    vec![CellValue::from("03101"), CellValue::Number(7.0)],
                ],
            )
            .unwrap();

        let rows = store.read_sheet("Rex Delivery - Summary").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Root", "Avg_distance_km"]);
        assert_eq!(rows[1], vec!["03100", "4.25"]);
        assert_eq!(rows[2], vec!["03101", "7"]);
    }

    #[test]
    fn replace_overwrites_previous_content() {
        let (_dir, mut store) = store();
        store
            .replace_sheet("S", &["a"], &[vec![CellValue::from("old")]])
            .unwrap();
        store
            .replace_sheet("S", &["a"], &[vec![CellValue::from("new")]])
            .unwrap();

        let rows = store.read_sheet("S").unwrap();
        assert_eq!(rows, vec![vec!["a".to_string()], vec!["new".to_string()]]);
    }

    #[test]
    fn update_cell_extends_the_header_row() {
        let (_dir, mut store) = store();
        store
            .replace_sheet("S", &["a", "b"], &[vec![CellValue::Int(1), CellValue::Int(2)]])
            .unwrap();
        store
            .update_cell("S", "L1", CellValue::from("01310100"))
            .unwrap();

        let rows = store.read_sheet("S").unwrap();
        assert_eq!(rows[0].len(), 12);
        assert_eq!(rows[0][11], "01310100");
        assert_eq!(rows[1], vec!["1", "2"]);
    }

    #[test]
    fn update_column_overwrites_a_slice() {
        let (_dir, mut store) = store();
        store
            .replace_sheet(
                "S",
                &["name", "km"],
                &[
                    vec![CellValue::from("a"), CellValue::Number(1.0)],
                    vec![CellValue::from("b"), CellValue::Number(2.0)],
                ],
            )
            .unwrap();
        store
            .update_column("S", 1, 1, &[CellValue::Number(9.5), CellValue::from("No route")])
            .unwrap();

        let rows = store.read_sheet("S").unwrap();
        assert_eq!(rows[1], vec!["a", "9.5"]);
        assert_eq!(rows[2], vec!["b", "No route"]);
    }

    #[test]
    fn rename_moves_the_sheet() {
        let (_dir, mut store) = store();
        store.replace_sheet("Rex - Detailed", &["a"], &[]).unwrap();
        store
            .rename_sheet("Rex - Detailed", "Rex - Routed")
            .unwrap();

        assert!(matches!(
            store.read_sheet("Rex - Detailed"),
            Err(StoreError::SheetNotFound(_))
        ));
        assert_eq!(store.read_sheet("Rex - Routed").unwrap().len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, mut store) = store();
        store.delete_sheet("never existed").unwrap();
        store.replace_sheet("S", &["a"], &[]).unwrap();
        store.delete_sheet("S").unwrap();
        store.delete_sheet("S").unwrap();
        assert!(store.list_sheets().unwrap().is_empty());
    }

    #[test]
    fn list_sheets_returns_sheet_names() {
        let (_dir, mut store) = store();
        store.replace_sheet("Rex - Detailed", &["a"], &[]).unwrap();
        store.replace_sheet("Rex - Summary", &["a"], &[]).unwrap();
        assert_eq!(
            store.list_sheets().unwrap(),
            vec!["Rex - Detailed".to_string(), "Rex - Summary".to_string()]
        );
    }

    #[test]
    fn missing_sheet_reads_as_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.read_sheet("ghost"),
            Err(StoreError::SheetNotFound(_))
        ));
    }

    #[test]
    fn empty_cells_render_as_empty_strings() {
        let (_dir, mut store) = store();
        store
            .replace_sheet(
                "S",
                &["a", "b"],
                &[vec![CellValue::Empty, CellValue::from("x")]],
            )
            .unwrap();
        let rows = store.read_sheet("S").unwrap();
        assert_eq!(rows[1], vec!["", "x"]);
    }
}
