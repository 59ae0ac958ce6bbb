pub mod auth;
pub mod clock;
pub mod config;
pub mod costing;
pub mod dashboard;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod store;

use auth::{require_auth, CallContext};
use clock::Clock;
use config::SheetConfig;
use error::CusteioError;
use extraction::{CellRange, Row, SheetSource};
use model::{SkippedRow, SyncResponse, INGREDIENTS, RECIPES};
use store::upsert::{UpsertCoordinator, LAST_UPDATED_FIELD};
use store::{to_document, DocumentStore};

/// Message returned when the sheet holds a header but no data row.
pub const NO_DATA_MESSAGE: &str = "no data found in the spreadsheet";

/// Sync the latest quotation of every ingredient marked for purchase into
/// the `insumos` collection.
///
/// Each written ingredient is stamped with the clock's current time. Fails
/// before any write when the header lacks a required column.
pub async fn sync_ingredient_prices(
    ctx: &CallContext,
    source: &dyn SheetSource,
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    sheet: &SheetConfig,
) -> Result<SyncResponse, CusteioError> {
    let caller = require_auth(ctx)?;
    tracing::info!(uid = %caller.uid, sheet = %sheet.sheet, range = %sheet.range, "syncing ingredient prices");

    let (rows, first_row_number) = read_sheet(source, sheet).await?;
    if rows.len() < 2 {
        return Ok(SyncResponse::ok(NO_DATA_MESSAGE));
    }

    let parsed = parsing::parse_quotation_sheet(&rows, first_row_number)?;
    log_skipped(&parsed.skipped_rows);

    let records = parsed
        .ingredients
        .iter()
        .map(|i| Ok((i.key.clone(), to_document(i)?)))
        .collect::<Result<Vec<_>, CusteioError>>()?;
    let written = UpsertCoordinator::new(store, clock)
        .upsert_all(INGREDIENTS, records, Some(LAST_UPDATED_FIELD))
        .await?;

    tracing::info!(
        written,
        skipped = parsed.skipped_rows.len(),
        "ingredient prices synced"
    );
    Ok(SyncResponse::ok(format!("{written} ingredient prices updated")))
}

/// Import every recipe group from the recipe sheet into `receitas`.
///
/// Recipes without any usable line item are not written.
pub async fn import_recipes(
    ctx: &CallContext,
    source: &dyn SheetSource,
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    sheet: &SheetConfig,
) -> Result<SyncResponse, CusteioError> {
    let caller = require_auth(ctx)?;
    tracing::info!(uid = %caller.uid, sheet = %sheet.sheet, range = %sheet.range, "importing recipes");

    let (rows, first_row_number) = read_sheet(source, sheet).await?;
    if rows.len() < 2 {
        return Ok(SyncResponse::ok(NO_DATA_MESSAGE));
    }

    let parsed = parsing::parse_recipe_sheet(&rows, first_row_number)?;
    log_skipped(&parsed.skipped_rows);
    for name in &parsed.empty_recipes {
        tracing::warn!(recipe = %name, "recipe without line items not imported");
    }

    let records = parsed
        .recipes
        .iter()
        .map(|r| Ok((r.key.clone(), to_document(r)?)))
        .collect::<Result<Vec<_>, CusteioError>>()?;
    let written = UpsertCoordinator::new(store, clock)
        .upsert_all(RECIPES, records, None)
        .await?;

    tracing::info!(
        written,
        empty = parsed.empty_recipes.len(),
        skipped = parsed.skipped_rows.len(),
        "recipes imported"
    );
    Ok(SyncResponse::ok(format!("{written} recipes imported or updated")))
}

/// Read the configured range. Any source failure surfaces as `SheetRead`.
pub async fn read_sheet(
    source: &dyn SheetSource,
    sheet: &SheetConfig,
) -> Result<(Vec<Row>, usize), CusteioError> {
    let range = CellRange::parse(&sheet.range)?;
    let rows = source
        .read_range(&sheet.sheet, &sheet.range)
        .await
        .map_err(|e| match e {
            CusteioError::SheetRead(_) => e,
            other => CusteioError::SheetRead(other.to_string()),
        })?;
    tracing::debug!(
        backend = source.backend_name(),
        rows = rows.len(),
        "sheet read"
    );
    Ok((rows, range.first_row_number()))
}

fn log_skipped(skipped: &[SkippedRow]) {
    for row in skipped {
        tracing::debug!(row_number = row.row_number, reason = %row.reason, "row skipped");
    }
}
