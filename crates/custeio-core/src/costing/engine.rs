use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::task::JoinSet;

use crate::costing::outcome::{LineCost, LineStatus, RecipeCost};
use crate::model::{Ingredient, Recipe, INGREDIENTS};
use crate::store::{DocumentStore, StoredDocument};

/// Cost a recipe against a lookup of ingredients by key.
///
/// Line items whose key is missing from `ingredients` count as zero and are
/// marked `NotFound`. A line whose cost would overflow, alone or added to the
/// total, counts as zero and is marked `Overflow`.
pub fn compute_recipe_cost(recipe: &Recipe, ingredients: &HashMap<String, Ingredient>) -> RecipeCost {
    let mut total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(recipe.line_items.len());

    for item in &recipe.line_items {
        let mut line = LineCost {
            ingredient_key: item.ingredient_key.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit: String::new(),
            unit_price: Decimal::ZERO,
            line_cost: Decimal::ZERO,
            status: LineStatus::NotFound,
        };

        if let Some(ingredient) = ingredients.get(&item.ingredient_key) {
            line.unit = ingredient.unit.clone();
            line.unit_price = ingredient.unit_price;
            match item
                .quantity
                .checked_mul(ingredient.unit_price)
                .and_then(|cost| total.checked_add(cost).map(|sum| (cost, sum)))
            {
                Some((cost, sum)) => {
                    line.line_cost = cost;
                    line.status = LineStatus::Priced;
                    total = sum;
                }
                None => {
                    tracing::warn!(
                        recipe = %recipe.key,
                        ingredient = %item.ingredient_key,
                        "line cost overflowed, counted as zero"
                    );
                    line.status = LineStatus::Overflow;
                }
            }
        }

        lines.push(line);
    }

    RecipeCost {
        recipe_key: recipe.key.clone(),
        recipe_name: recipe.name.clone(),
        lines,
        total_ingredient_cost: total,
        wastage: recipe.wastage,
        cost_per_kg: per_yield(total, recipe.yield_kg),
        cost_per_unit: per_yield(total, recipe.yield_units),
    }
}

fn per_yield(total: Decimal, yield_amount: Decimal) -> Option<Decimal> {
    if yield_amount > Decimal::ZERO {
        total.checked_div(yield_amount)
    } else {
        None
    }
}

/// Read every distinct ingredient referenced by `recipe`, one concurrent read
/// per key.
///
/// Keys that are missing, fail to read or fail to decode are absent from the
/// result.
pub async fn fetch_line_ingredients(
    store: Arc<dyn DocumentStore>,
    recipe: &Recipe,
) -> HashMap<String, Ingredient> {
    let mut reads = JoinSet::new();
    let mut seen = std::collections::HashSet::new();
    for item in &recipe.line_items {
        if !seen.insert(item.ingredient_key.clone()) {
            continue;
        }
        let store = Arc::clone(&store);
        let key = item.ingredient_key.clone();
        reads.spawn(async move {
            let result = store.get(INGREDIENTS, &key).await;
            (key, result)
        });
    }

    let mut found = HashMap::new();
    while let Some(joined) = reads.join_next().await {
        let (key, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "ingredient read task failed");
                continue;
            }
        };
        match result {
            Ok(Some(data)) => {
                let doc = StoredDocument {
                    key: key.clone(),
                    data,
                };
                match doc.decode::<Ingredient>() {
                    Ok(mut ingredient) => {
                        ingredient.key = key.clone();
                        found.insert(key, ingredient);
                    }
                    Err(e) => tracing::warn!(key = %key, error = %e, "undecodable ingredient"),
                }
            }
            Ok(None) => tracing::debug!(key = %key, "ingredient not found"),
            Err(e) => tracing::warn!(key = %key, error = %e, "ingredient read failed"),
        }
    }
    found
}
