use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::extraction::{cell, text_cell, Row};
use crate::model::{Ingredient, SkipReason, SkippedRow};
use crate::parsing::header::QuotationColumns;
use crate::parsing::normalize::normalize_key;
use crate::parsing::values::{parse_decimal, parse_decimal_opt, parse_quotation_date};

/// The winning quotation row for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quotation<'a> {
    pub row_number: usize,
    pub key: String,
    pub opened_on: NaiveDate,
    pub row: &'a [String],
}

#[derive(Debug, Clone, Default)]
pub struct LatestQuotations<'a> {
    /// One entry per product, in order of first appearance.
    pub winners: Vec<Quotation<'a>>,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Pick the most recent quotation per product.
///
/// Only rows with a positive "Comprar" quantity take part. Rows without a
/// product name or a readable `DD/MM/YYYY` opening date are skipped. A later
/// row replaces the current winner only when its date is strictly later, so
/// among equal dates the first one stays.
pub fn select_latest<'a>(
    rows: &'a [Row],
    columns: &QuotationColumns,
    first_row_number: usize,
) -> LatestQuotations<'a> {
    let mut out = LatestQuotations::default();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let row_number = first_row_number + i;
        let mut skip = |reason: SkipReason| {
            tracing::debug!(row_number, %reason, "quotation row skipped");
            out.skipped_rows.push(SkippedRow { row_number, reason });
        };

        if parse_decimal(cell(row, columns.to_purchase), Decimal::ZERO) <= Decimal::ZERO {
            skip(SkipReason::NotMarkedForPurchase);
            continue;
        }
        let Some(name) = text_cell(row, columns.product) else {
            skip(SkipReason::MissingProductName);
            continue;
        };
        let key = normalize_key(name);
        if key.is_empty() {
            skip(SkipReason::MissingProductName);
            continue;
        }
        let Some(raw_date) = text_cell(row, columns.opened_on) else {
            skip(SkipReason::MissingQuotationDate);
            continue;
        };
        let Some(opened_on) = parse_quotation_date(raw_date) else {
            skip(SkipReason::InvalidQuotationDate(raw_date.to_string()));
            continue;
        };

        let candidate = Quotation {
            row_number,
            key,
            opened_on,
            row,
        };
        match by_key.get(&candidate.key) {
            Some(&idx) => {
                if candidate.opened_on > out.winners[idx].opened_on {
                    out.winners[idx] = candidate;
                }
            }
            None => {
                by_key.insert(candidate.key.clone(), out.winners.len());
                out.winners.push(candidate);
            }
        }
    }

    out
}

impl Quotation<'_> {
    /// Build the ingredient record for this quotation.
    pub fn to_ingredient(&self, columns: &QuotationColumns) -> Result<Ingredient, SkipReason> {
        let raw_price = cell(self.row, columns.price);
        let unit_price = parse_decimal_opt(raw_price)
            .filter(|p| !p.is_sign_negative())
            .ok_or_else(|| SkipReason::InvalidPrice(raw_price.unwrap_or_default().to_string()))?;

        Ok(Ingredient {
            key: self.key.clone(),
            name: text_cell(self.row, columns.product)
                .unwrap_or_default()
                .to_string(),
            unit: text_cell(self.row, columns.unit)
                .unwrap_or_default()
                .to_string(),
            unit_price,
            quotation_date: Some(
                Utc.from_utc_datetime(&self.opened_on.and_time(NaiveTime::default())),
            ),
        })
    }
}
