use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;

use crate::NoticeContainer;

#[derive(Debug, Clone)]
pub struct CsvTable<T> {
    pub rows: Vec<T>,
    pub row_numbers: Vec<u64>,
}

impl<T> Default for CsvTable<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            row_numbers: Vec::new(),
        }
    }
}

impl<T> CsvTable<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        let row_numbers = (0..rows.len()).map(|index| index as u64 + 2).collect();
        Self { rows, row_numbers }
    }

    /// 1-based line number of the row in its source file; the header is line 1.
    pub fn row_number(&self, index: usize) -> u64 {
        self.row_numbers
            .get(index)
            .copied()
            .unwrap_or(index as u64 + 2)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: T, row_number: u64) {
        self.rows.push(row);
        self.row_numbers.push(row_number);
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{file}: {message}")]
pub struct CsvParseError {
    pub file: String,
    pub message: String,
    pub line_index: Option<u64>,
    pub column_index: Option<u64>,
    pub parsed_content: Option<String>,
}

impl CsvParseError {
    fn from_csv(file: &str, error: &csv::Error, record: Option<&StringRecord>) -> Self {
        let line_index = error.position().map(|position| position.line());
        let column_index = match error.kind() {
            csv::ErrorKind::Deserialize { err, .. } => err.field(),
            _ => None,
        };
        Self {
            file: file.to_string(),
            message: error.to_string(),
            line_index,
            column_index,
            parsed_content: record.map(|record| record.iter().collect::<Vec<_>>().join(",")),
        }
    }
}

/// Reads a whole table, failing on the first malformed row.
pub fn read_csv_from_reader<T, R>(reader: R, file: &str) -> Result<CsvTable<T>, CsvParseError>
where
    T: DeserializeOwned,
    R: std::io::Read,
{
    let mut strict_error = None;
    let table = read_rows(reader, file, &mut |error| {
        if strict_error.is_none() {
            strict_error = Some(error);
        }
    })?;
    match strict_error {
        Some(error) => Err(error),
        None => Ok(table),
    }
}

/// Reads a table, skipping malformed rows and reporting each one as a
/// `csv_parsing_failed` notice. Only an unreadable header is fatal.
pub fn read_csv_with_notices<T>(
    data: &[u8],
    file: &str,
    notices: &mut NoticeContainer,
) -> Result<CsvTable<T>, CsvParseError>
where
    T: DeserializeOwned,
{
    read_rows(strip_utf8_bom(data), file, &mut |error| {
        notices.push_csv_error(&error);
    })
}

fn read_rows<T, R>(
    reader: R,
    file: &str,
    on_row_error: &mut dyn FnMut(CsvParseError),
) -> Result<CsvTable<T>, CsvParseError>
where
    T: DeserializeOwned,
    R: std::io::Read,
{
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| CsvParseError::from_csv(file, &err, None))?
        .clone();
    let mut table = CsvTable::default();

    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(err) => {
                on_row_error(CsvParseError::from_csv(file, &err, None));
                continue;
            }
        }
        if record.iter().all(|value| value.is_empty()) {
            continue;
        }
        let row_number = record
            .position()
            .map(|position| position.line())
            .unwrap_or(table.rows.len() as u64 + 2);
        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => table.push(row, row_number),
            Err(err) => {
                let mut error = CsvParseError::from_csv(file, &err, Some(&record));
                if error.line_index.is_none() {
                    error.line_index = Some(row_number);
                }
                on_row_error(error);
            }
        }
    }

    Ok(table)
}

fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
        amount: f64,
        note: Option<String>,
    }

    #[test]
    fn reads_rows_with_trimmed_cells_and_null_empties() {
        let data = "id,amount,note\n A , 2.50 ,\nB,-1,hello\n";
        let table: CsvTable<Row> = read_csv_from_reader(data.as_bytes(), "rows.txt").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].id, "A");
        assert_eq!(table.rows[0].amount, 2.5);
        assert!(table.rows[0].note.is_none());
        assert_eq!(table.rows[1].note.as_deref(), Some("hello"));
        assert_eq!(table.row_number(0), 2);
        assert_eq!(table.row_number(1), 3);
    }

    #[test]
    fn strict_reader_fails_on_bad_row() {
        let data = "id,amount,note\nA,abc,\n";
        let result: Result<CsvTable<Row>, _> = read_csv_from_reader(data.as_bytes(), "rows.txt");
        let error = result.unwrap_err();
        assert_eq!(error.file, "rows.txt");
        assert_eq!(error.line_index, Some(2));
    }

    #[test]
    fn skips_bad_rows_and_reports_notices() {
        let data = "\u{feff}id,amount,note\nA,abc,\nB,1.25,\n";
        let mut notices = NoticeContainer::new();
        let table: CsvTable<Row> =
            read_csv_with_notices(data.as_bytes(), "rows.txt", &mut notices).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].id, "B");
        assert_eq!(table.row_number(0), 3);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices.iter().next().unwrap().code, "csv_parsing_failed");
    }
}
