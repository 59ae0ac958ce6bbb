use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};

use crate::error::CusteioError;
use crate::extraction::{CellRange, Row, SheetSource};

/// Spreadsheet source backed by a local workbook file (.xlsx, .xls, .ods).
///
/// Cells come back as the text a spreadsheet UI would show: decimals with a
/// dot, dates as `dd/mm/yyyy`. Trailing empty cells and rows are dropped.
pub struct XlsxSheetSource {
    path: PathBuf,
}

impl XlsxSheetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SheetSource for XlsxSheetSource {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Row>, CusteioError> {
        let range = CellRange::parse(range)?;
        let path = self.path.clone();
        let sheet = sheet.to_string();

        // calamine is blocking IO
        tokio::task::spawn_blocking(move || read_sheet(&path, &sheet, range))
            .await
            .map_err(|e| CusteioError::SheetRead(format!("read task failed: {e}")))?
    }

    fn backend_name(&self) -> &str {
        "xlsx"
    }
}

fn read_sheet(path: &Path, sheet: &str, range: CellRange) -> Result<Vec<Row>, CusteioError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CusteioError::SheetRead(format!("failed to open {}: {e}", path.display())))?;

    let cells = workbook
        .worksheet_range(sheet)
        .map_err(|e| CusteioError::SheetRead(format!("sheet '{sheet}' not readable: {e}")))?;

    let Some((last_row, last_col)) = cells.end() else {
        return Ok(Vec::new());
    };

    let end_row = range.end_row.map_or(last_row, |r| r.min(last_row));
    let end_col = range.end_col.min(last_col);

    let mut rows = Vec::new();
    for r in range.start_row..=end_row {
        let mut row: Row = (range.start_col..=end_col)
            .map(|c| cells.get_value((r, c)).map(cell_as_string).unwrap_or_default())
            .collect();
        while row.last().is_some_and(|s| s.is_empty()) {
            row.pop();
        }
        rows.push(row);
    }

    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }

    Ok(rows)
}

fn cell_as_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => ndt.format("%d/%m/%Y").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_as_string_numbers() {
        assert_eq!(cell_as_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_as_string(&Data::Float(7.0)), "7");
        assert_eq!(cell_as_string(&Data::Int(3)), "3");
        assert_eq!(cell_as_string(&Data::Empty), "");
    }

    #[test]
    fn test_cell_as_string_text_is_untouched() {
        assert_eq!(
            cell_as_string(&Data::String(" R$ 7,00 ".into())),
            " R$ 7,00 "
        );
    }

    #[tokio::test]
    async fn test_missing_workbook_is_sheet_read_error() {
        let source = XlsxSheetSource::new("/nonexistent/planilha.xlsx");
        match source.read_range("Cotacoes", "A:M").await {
            Err(CusteioError::SheetRead(msg)) => assert!(msg.contains("planilha.xlsx")),
            other => panic!("expected SheetRead, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_range_rejected_before_io() {
        let source = XlsxSheetSource::new("/nonexistent/planilha.xlsx");
        assert!(matches!(
            source.read_range("Cotacoes", "M:A").await,
            Err(CusteioError::InvalidRange(_))
        ));
    }
}
