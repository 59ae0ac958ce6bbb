use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a line item was costed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Priced,
    /// The ingredient key did not resolve; the line is costed at zero.
    NotFound,
    /// The line cost, or the running total with it, does not fit in a
    /// `Decimal`; the line is costed at zero.
    Overflow,
}

/// Cost of one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCost {
    pub ingredient_key: String,
    /// Name as written on the recipe row.
    pub name: String,
    pub quantity: Decimal,
    /// Unit of the resolved ingredient, empty when not found.
    pub unit: String,
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub line_cost: Decimal,
    pub status: LineStatus,
}

/// Cost breakdown for a recipe against current ingredient prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCost {
    pub recipe_key: String,
    pub recipe_name: String,
    pub lines: Vec<LineCost>,
    /// Sum of all line costs.
    pub total_ingredient_cost: Decimal,
    pub wastage: Decimal,
    /// Total divided by the weight yield, when the yield is positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_kg: Option<Decimal>,
    /// Total divided by the unit yield, when the yield is positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<Decimal>,
}

impl RecipeCost {
    pub fn missing_lines(&self) -> impl Iterator<Item = &LineCost> {
        self.lines
            .iter()
            .filter(|l| l.status == LineStatus::NotFound)
    }

    /// Lines left out of the total because their cost overflowed.
    pub fn overflowed_lines(&self) -> impl Iterator<Item = &LineCost> {
        self.lines
            .iter()
            .filter(|l| l.status == LineStatus::Overflow)
    }
}
