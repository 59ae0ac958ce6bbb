pub mod range;
pub mod xlsx;

use crate::error::CusteioError;
use async_trait::async_trait;

pub use range::CellRange;

/// One spreadsheet row. Rows are ragged: trailing empty cells may be missing.
pub type Row = Vec<String>;

/// Read-only tabular access to a spreadsheet, by sheet name and A1 range.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Read the cells of `range` on `sheet`, one `Row` per sheet row.
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Row>, CusteioError>;

    /// Name of this source backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Raw cell at `idx`, or `None` when the row is too short.
pub fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(String::as_str)
}

/// Trimmed cell text, or `None` when absent or blank.
pub fn text_cell(row: &[String], idx: usize) -> Option<&str> {
    cell(row, idx).map(str::trim).filter(|s| !s.is_empty())
}
