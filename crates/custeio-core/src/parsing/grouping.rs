use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::extraction::{cell, text_cell, Row};
use crate::model::{Recipe, RecipeLineItem, SkipReason, SkippedRow};
use crate::parsing::header::RecipeColumns;
use crate::parsing::normalize::normalize_key;
use crate::parsing::values::{parse_decimal, wastage_fraction};
use crate::parsing::ParsedRecipes;

/// Fold recipe sheet rows into grouped recipes.
///
/// The recipe name is usually written once, with the ingredient rows below it
/// left blank in the "Produto" column. The scan carries the last seen recipe
/// down until another name appears. A name whose key was seen before (so
/// "Bolo" and "bolo" alike) continues that group; name, yields and wastage
/// come from the first row of the group.
///
/// Recipes that end up without any line item are dropped.
pub fn group_recipe_rows(
    rows: &[Row],
    columns: &RecipeColumns,
    first_row_number: usize,
) -> ParsedRecipes {
    rows.iter()
        .enumerate()
        .fold(GroupingState::default(), |state, (i, row)| {
            state.step(first_row_number + i, row, columns)
        })
        .finish()
}

#[derive(Debug, Default)]
struct GroupingState {
    groups: Vec<Recipe>,
    by_key: HashMap<String, usize>,
    current: Option<usize>,
    skipped_rows: Vec<SkippedRow>,
}

impl GroupingState {
    fn step(mut self, row_number: usize, row: &[String], columns: &RecipeColumns) -> Self {
        if let Some(name) = text_cell(row, columns.product) {
            let key = normalize_key(name);
            let idx = match self.by_key.get(&key) {
                Some(&idx) => idx,
                None => {
                    self.groups.push(new_group(name, row, columns));
                    let idx = self.groups.len() - 1;
                    self.by_key.insert(key, idx);
                    idx
                }
            };
            self.current = Some(idx);
        }

        if let Some(ingredient) = text_cell(row, columns.ingredient) {
            match self.current {
                Some(idx) => {
                    let quantity = parse_decimal(cell(row, columns.quantity), Decimal::ZERO);
                    if quantity > Decimal::ZERO {
                        self.groups[idx].line_items.push(RecipeLineItem {
                            ingredient_key: normalize_key(ingredient),
                            name: ingredient.to_string(),
                            quantity,
                        });
                    } else {
                        self.skip(
                            row_number,
                            SkipReason::NonPositiveQuantity(ingredient.to_string()),
                        );
                    }
                }
                None => self.skip(
                    row_number,
                    SkipReason::IngredientWithoutRecipe(ingredient.to_string()),
                ),
            }
        }

        self
    }

    fn skip(&mut self, row_number: usize, reason: SkipReason) {
        tracing::debug!(row_number, %reason, "recipe row skipped");
        self.skipped_rows.push(SkippedRow { row_number, reason });
    }

    fn finish(self) -> ParsedRecipes {
        let (recipes, empty): (Vec<Recipe>, Vec<Recipe>) = self
            .groups
            .into_iter()
            .partition(|g| !g.line_items.is_empty());

        ParsedRecipes {
            recipes,
            empty_recipes: empty.into_iter().map(|g| g.name).collect(),
            skipped_rows: self.skipped_rows,
        }
    }
}

fn new_group(name: &str, row: &[String], columns: &RecipeColumns) -> Recipe {
    Recipe {
        key: normalize_key(name),
        name: name.to_string(),
        yield_kg: non_negative(parse_decimal(cell(row, columns.yield_kg), Decimal::ZERO)),
        yield_units: non_negative(parse_decimal(cell(row, columns.yield_units), Decimal::ZERO)),
        wastage: wastage_fraction(cell(row, columns.wastage)),
        line_items: Vec::new(),
    }
}

fn non_negative(v: Decimal) -> Decimal {
    v.max(Decimal::ZERO)
}
