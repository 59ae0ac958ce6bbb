//! Read-side views over the store: listings, search, cost breakdown and
//! live subscriptions.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::costing::{compute_recipe_cost, fetch_line_ingredients, RecipeCost};
use crate::error::CusteioError;
use crate::model::{Ingredient, Recipe, INGREDIENTS, METADATA, RECIPES};
use crate::parsing::normalize::fold_for_search;
use crate::store::{DocumentStore, StoredDocument};

/// Field of `metadata/insumos` holding the last full price sync.
pub const LAST_SYNC_FIELD: &str = "ultimaAtualizacaoGeral";

/// Records that carry their document key outside the body.
pub trait Keyed {
    fn set_key(&mut self, key: String);
}

impl Keyed for Ingredient {
    fn set_key(&mut self, key: String) {
        self.key = key;
    }
}

impl Keyed for Recipe {
    fn set_key(&mut self, key: String) {
        self.key = key;
    }
}

fn decode_all<T: DeserializeOwned + Keyed>(collection: &str, docs: Vec<StoredDocument>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(mut record) => {
                record.set_key(doc.key);
                Some(record)
            }
            Err(e) => {
                tracing::warn!(collection, key = %doc.key, error = %e, "skipping undecodable document");
                None
            }
        })
        .collect()
}

/// All ingredients ordered by name.
pub async fn list_ingredients(store: &dyn DocumentStore) -> Result<Vec<Ingredient>, CusteioError> {
    Ok(decode_all(INGREDIENTS, store.list(INGREDIENTS).await?))
}

/// All recipes ordered by name.
pub async fn list_recipes(store: &dyn DocumentStore) -> Result<Vec<Recipe>, CusteioError> {
    Ok(decode_all(RECIPES, store.list(RECIPES).await?))
}

/// Keep ingredients whose name, unit, price or quotation date contains
/// `term`, ignoring case and accents. A blank term keeps everything.
pub fn filter_ingredients<'a>(items: &'a [Ingredient], term: &str) -> Vec<&'a Ingredient> {
    let term = term.trim();
    if term.is_empty() {
        return items.iter().collect();
    }
    let folded = fold_for_search(term);
    let price_term = term.replace(',', ".");

    items
        .iter()
        .filter(|item| {
            fold_for_search(&item.name).contains(&folded)
                || fold_for_search(&item.unit).contains(&folded)
                || item.unit_price.to_string().contains(&price_term)
                || item
                    .quotation_date
                    .map(|d| d.format("%d/%m/%Y").to_string().contains(term))
                    .unwrap_or(false)
        })
        .collect()
}

/// Time of the last full price sync, if one was ever recorded.
pub async fn last_sync(store: &dyn DocumentStore) -> Result<Option<DateTime<Utc>>, CusteioError> {
    let Some(doc) = store.get(METADATA, INGREDIENTS).await? else {
        return Ok(None);
    };
    let stamp = doc
        .get(LAST_SYNC_FIELD)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    Ok(stamp)
}

/// Load a recipe and cost it against the current ingredient prices.
pub async fn recipe_cost_breakdown(
    store: Arc<dyn DocumentStore>,
    recipe_key: &str,
) -> Result<RecipeCost, CusteioError> {
    let data = store
        .get(RECIPES, recipe_key)
        .await?
        .ok_or_else(|| CusteioError::NotFound {
            collection: RECIPES.into(),
            key: recipe_key.into(),
        })?;
    let mut recipe: Recipe = StoredDocument {
        key: recipe_key.into(),
        data,
    }
    .decode()?;
    recipe.key = recipe_key.into();

    let ingredients = fetch_line_ingredients(Arc::clone(&store), &recipe).await;
    let cost = compute_recipe_cost(&recipe, &ingredients);
    tracing::debug!(
        recipe = %recipe_key,
        total = %cost.total_ingredient_cost,
        missing = cost.missing_lines().count(),
        "recipe costed"
    );
    Ok(cost)
}

/// Render the ingredient listing now and again after every change, until
/// `render` breaks or the store goes away.
pub async fn watch_ingredients<F>(store: &dyn DocumentStore, render: F) -> Result<(), CusteioError>
where
    F: FnMut(Vec<Ingredient>) -> ControlFlow<()>,
{
    watch_collection(store, INGREDIENTS, render).await
}

/// Recipe counterpart of [`watch_ingredients`].
pub async fn watch_recipes<F>(store: &dyn DocumentStore, render: F) -> Result<(), CusteioError>
where
    F: FnMut(Vec<Recipe>) -> ControlFlow<()>,
{
    watch_collection(store, RECIPES, render).await
}

async fn watch_collection<T, F>(
    store: &dyn DocumentStore,
    collection: &str,
    mut render: F,
) -> Result<(), CusteioError>
where
    T: DeserializeOwned + Keyed,
    F: FnMut(Vec<T>) -> ControlFlow<()>,
{
    // Subscribe before the first read so no change is missed in between.
    let mut subscription = store.subscribe(collection);
    loop {
        let snapshot = decode_all(collection, store.list(collection).await?);
        if render(snapshot).is_break() {
            return Ok(());
        }
        if !subscription.changed().await {
            return Ok(());
        }
    }
}
