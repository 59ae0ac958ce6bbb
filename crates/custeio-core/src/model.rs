use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const INGREDIENTS: &str = "insumos";
pub const RECIPES: &str = "receitas";
pub const METADATA: &str = "metadata";

/// A raw ingredient with its current unit price.
///
/// The document id is the normalized key; it is not stored in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(skip)]
    pub key: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "unidade", default)]
    pub unit: String,
    #[serde(rename = "preco", default)]
    pub unit_price: Decimal,
    #[serde(
        rename = "dataCotacao",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub quotation_date: Option<DateTime<Utc>>,
}

/// One ingredient usage inside a recipe. `ingredient_key` is a weak reference
/// and may point at an ingredient that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLineItem {
    #[serde(rename = "insumoId")]
    pub ingredient_key: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "quantidade")]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(skip)]
    pub key: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "rendimentoKg", default)]
    pub yield_kg: Decimal,
    #[serde(rename = "rendimentoUn", default)]
    pub yield_units: Decimal,
    /// Expected process loss as a fraction in [0, 1).
    #[serde(rename = "perda", default)]
    pub wastage: Decimal,
    #[serde(rename = "insumos", default)]
    pub line_items: Vec<RecipeLineItem>,
}

/// A spreadsheet row that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based row number in the sheet.
    pub row_number: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotMarkedForPurchase,
    MissingProductName,
    MissingQuotationDate,
    InvalidQuotationDate(String),
    InvalidPrice(String),
    NonPositiveQuantity(String),
    IngredientWithoutRecipe(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotMarkedForPurchase => write!(f, "not marked for purchase"),
            SkipReason::MissingProductName => write!(f, "missing product name"),
            SkipReason::MissingQuotationDate => write!(f, "missing quotation date"),
            SkipReason::InvalidQuotationDate(raw) => write!(f, "invalid quotation date '{raw}'"),
            SkipReason::InvalidPrice(raw) => write!(f, "invalid price '{raw}'"),
            SkipReason::NonPositiveQuantity(name) => {
                write!(f, "non-positive quantity for '{name}'")
            }
            SkipReason::IngredientWithoutRecipe(name) => {
                write!(f, "ingredient '{name}' appears before any recipe")
            }
        }
    }
}

/// Success payload returned by the sync triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
}

impl SyncResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
