use crate::error::CusteioError;
use std::collections::HashMap;

pub const PRODUCT: &str = "Produto";
pub const UNIT: &str = "UN";
pub const PRICE: &str = "Preço";
pub const TO_PURCHASE: &str = "Comprar";
pub const OPENED_ON: &str = "Data Abertura";

pub const INGREDIENT: &str = "Insumos";
pub const QUANTITY: &str = "Quantidade";
pub const YIELD_KG: &str = "Rendimento KG";
pub const YIELD_UNITS: &str = "Rendimento UN";
pub const WASTAGE: &str = "Perda";

pub const QUOTATION_COLUMNS: [&str; 5] = [PRODUCT, UNIT, PRICE, TO_PURCHASE, OPENED_ON];
pub const RECIPE_COLUMNS: [&str; 6] = [PRODUCT, INGREDIENT, QUANTITY, YIELD_KG, YIELD_UNITS, WASTAGE];

/// Label -> column position for one header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn position(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    fn require(&self, label: &str) -> Result<usize, CusteioError> {
        self.position(label)
            .ok_or_else(|| CusteioError::MissingColumn {
                column: label.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Map each required label to its position in `header`.
///
/// Matching is exact and case-sensitive; when a label occurs twice the first
/// occurrence wins. Fails on the first required label (in `required` order)
/// that is missing.
pub fn resolve_columns(header: &[String], required: &[&str]) -> Result<ColumnIndex, CusteioError> {
    let mut positions = HashMap::with_capacity(required.len());
    for label in required {
        let idx = header
            .iter()
            .position(|cell| cell == label)
            .ok_or_else(|| CusteioError::MissingColumn {
                column: label.to_string(),
            })?;
        positions.insert(label.to_string(), idx);
    }
    Ok(ColumnIndex { positions })
}

/// Column positions for the quotation ("Cotacoes") sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotationColumns {
    pub product: usize,
    pub unit: usize,
    pub price: usize,
    pub to_purchase: usize,
    pub opened_on: usize,
}

impl QuotationColumns {
    pub fn resolve(header: &[String]) -> Result<Self, CusteioError> {
        let index = resolve_columns(header, &QUOTATION_COLUMNS)?;
        Ok(Self {
            product: index.require(PRODUCT)?,
            unit: index.require(UNIT)?,
            price: index.require(PRICE)?,
            to_purchase: index.require(TO_PURCHASE)?,
            opened_on: index.require(OPENED_ON)?,
        })
    }
}

/// Column positions for the recipe ("Receitas") sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeColumns {
    pub product: usize,
    pub ingredient: usize,
    pub quantity: usize,
    pub yield_kg: usize,
    pub yield_units: usize,
    pub wastage: usize,
}

impl RecipeColumns {
    pub fn resolve(header: &[String]) -> Result<Self, CusteioError> {
        let index = resolve_columns(header, &RECIPE_COLUMNS)?;
        Ok(Self {
            product: index.require(PRODUCT)?,
            ingredient: index.require(INGREDIENT)?,
            quantity: index.require(QUANTITY)?,
            yield_kg: index.require(YIELD_KG)?,
            yield_units: index.require(YIELD_UNITS)?,
            wastage: index.require(WASTAGE)?,
        })
    }
}
