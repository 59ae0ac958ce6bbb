pub mod grouping;
pub mod header;
pub mod normalize;
pub mod quotations;
pub mod values;

use serde::Serialize;

use crate::error::CusteioError;
use crate::extraction::Row;
use crate::model::{Ingredient, Recipe, SkippedRow};
use grouping::group_recipe_rows;
use header::{QuotationColumns, RecipeColumns};
use quotations::select_latest;

/// Recipes grouped from a recipe sheet, plus diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedRecipes {
    pub recipes: Vec<Recipe>,
    /// Recipe names that had no usable line item.
    pub empty_recipes: Vec<String>,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Latest-price ingredients selected from a quotation sheet, plus diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedQuotations {
    pub ingredients: Vec<Ingredient>,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Parse a recipe sheet whose first row is the header.
///
/// `first_row_number` is the 1-based sheet row of `rows[0]`. Returns an empty
/// result when there is no data row; fails if a required column is missing.
pub fn parse_recipe_sheet(
    rows: &[Row],
    first_row_number: usize,
) -> Result<ParsedRecipes, CusteioError> {
    let Some((header, data)) = rows.split_first() else {
        return Ok(ParsedRecipes::default());
    };
    let columns = RecipeColumns::resolve(header)?;
    Ok(group_recipe_rows(data, &columns, first_row_number + 1))
}

/// Parse a quotation sheet whose first row is the header.
pub fn parse_quotation_sheet(
    rows: &[Row],
    first_row_number: usize,
) -> Result<ParsedQuotations, CusteioError> {
    let Some((header, data)) = rows.split_first() else {
        return Ok(ParsedQuotations::default());
    };
    let columns = QuotationColumns::resolve(header)?;
    let latest = select_latest(data, &columns, first_row_number + 1);

    let mut parsed = ParsedQuotations {
        ingredients: Vec::with_capacity(latest.winners.len()),
        skipped_rows: latest.skipped_rows,
    };
    for quotation in &latest.winners {
        match quotation.to_ingredient(&columns) {
            Ok(ingredient) => parsed.ingredients.push(ingredient),
            Err(reason) => {
                tracing::warn!(row_number = quotation.row_number, %reason, "latest quotation dropped");
                parsed.skipped_rows.push(SkippedRow {
                    row_number: quotation.row_number,
                    reason,
                });
            }
        }
    }
    Ok(parsed)
}
