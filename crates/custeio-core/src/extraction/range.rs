use crate::error::CusteioError;

/// A rectangular A1-notation range such as `A:M`, `A2:M` or `B3:H200`.
///
/// Positions are 0-indexed. An open end (`A:M`) reads to the last used row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: Option<u32>,
    pub end_col: u32,
}

impl CellRange {
    pub fn parse(s: &str) -> Result<CellRange, CusteioError> {
        let s = s.trim();
        let (start, end) = match s.split_once(':') {
            Some((a, b)) => (a, b),
            None => (s, s),
        };

        let (start_col, start_row) = parse_ref(start)
            .ok_or_else(|| CusteioError::InvalidRange(format!("bad start '{start}' in '{s}'")))?;
        let (end_col, end_row) = parse_ref(end)
            .ok_or_else(|| CusteioError::InvalidRange(format!("bad end '{end}' in '{s}'")))?;

        let range = CellRange {
            start_row: start_row.unwrap_or(0),
            start_col,
            end_row,
            end_col,
        };

        if range.end_col < range.start_col {
            return Err(CusteioError::InvalidRange(format!(
                "end column before start column in '{s}'"
            )));
        }
        if let Some(end_row) = range.end_row {
            if end_row < range.start_row {
                return Err(CusteioError::InvalidRange(format!(
                    "end row before start row in '{s}'"
                )));
            }
        }
        Ok(range)
    }

    /// 1-based sheet row number of the first row in this range.
    pub fn first_row_number(&self) -> usize {
        self.start_row as usize + 1
    }
}

/// Parse a cell reference like "B3" or a bare column like "M".
/// Returns (column, optional row), both 0-indexed.
fn parse_ref(s: &str) -> Option<(u32, Option<u32>)> {
    let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        let v = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26)?.checked_add(v)?;
    }

    let row = if digits.is_empty() {
        None
    } else {
        let n: u32 = digits.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some(n - 1)
    };

    Some((col - 1, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_columns() {
        let r = CellRange::parse("A:M").unwrap();
        assert_eq!(r.start_row, 0);
        assert_eq!(r.start_col, 0);
        assert_eq!(r.end_col, 12);
        assert_eq!(r.end_row, None);
    }

    #[test]
    fn test_start_row() {
        let r = CellRange::parse("A2:M").unwrap();
        assert_eq!(r.start_row, 1);
        assert_eq!(r.first_row_number(), 2);
    }

    #[test]
    fn test_bounded() {
        let r = CellRange::parse("B3:H200").unwrap();
        assert_eq!((r.start_col, r.start_row), (1, 2));
        assert_eq!((r.end_col, r.end_row), (7, Some(199)));
    }

    #[test]
    fn test_double_letter_columns() {
        let r = CellRange::parse("Z1:AB1").unwrap();
        assert_eq!(r.start_col, 25);
        assert_eq!(r.end_col, 27);
    }

    #[test]
    fn test_single_cell() {
        let r = CellRange::parse("c4").unwrap();
        assert_eq!((r.start_col, r.start_row, r.end_col, r.end_row), (2, 3, 2, Some(3)));
    }

    #[test]
    fn test_invalid() {
        assert!(CellRange::parse("").is_err());
        assert!(CellRange::parse("2:10").is_err());
        assert!(CellRange::parse("M:A").is_err());
        assert!(CellRange::parse("A0:B").is_err());
        assert!(CellRange::parse("A10:B2").is_err());
        assert!(CellRange::parse("Cotacoes!A:M").is_err());
    }
}
