use std::sync::Arc;

use custeio_core::dashboard;
use custeio_core::error::CusteioError;
use custeio_core::parsing::normalize::normalize_key;
use custeio_core::store::json_file::JsonFileStore;
use custeio_core::store::DocumentStore;

use crate::output;
use crate::{Format, Settings};

pub async fn ingredients(
    settings: &Settings,
    search: Option<&str>,
    format: Format,
) -> Result<(), CusteioError> {
    let store = JsonFileStore::new(&settings.config.store);
    let all = dashboard::list_ingredients(&store).await?;
    let shown = dashboard::filter_ingredients(&all, search.unwrap_or_default());

    match format {
        Format::Json => output::json::print(&shown),
        Format::Table => {
            let last_sync = dashboard::last_sync(&store).await?;
            print!("{}", output::table::format_ingredients(&shown, last_sync));
            Ok(())
        }
    }
}

pub async fn recipes(settings: &Settings, format: Format) -> Result<(), CusteioError> {
    let store = JsonFileStore::new(&settings.config.store);
    let recipes = dashboard::list_recipes(&store).await?;

    match format {
        Format::Json => output::json::print(&recipes),
        Format::Table => {
            print!("{}", output::table::format_recipes(&recipes));
            Ok(())
        }
    }
}

pub async fn cost(settings: &Settings, recipe: &str, format: Format) -> Result<(), CusteioError> {
    let store: Arc<dyn DocumentStore> = Arc::new(JsonFileStore::new(&settings.config.store));
    let cost = dashboard::recipe_cost_breakdown(store, &normalize_key(recipe)).await?;

    match format {
        Format::Json => output::json::print(&cost),
        Format::Table => {
            print!("{}", output::table::format_cost(&cost));
            Ok(())
        }
    }
}
