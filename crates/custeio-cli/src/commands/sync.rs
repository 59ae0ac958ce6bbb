use custeio_core::clock::SystemClock;
use custeio_core::error::CusteioError;
use custeio_core::extraction::xlsx::XlsxSheetSource;
use custeio_core::model::SyncResponse;
use custeio_core::store::json_file::JsonFileStore;

use crate::output;
use crate::{Format, Settings};

pub async fn prices(settings: &Settings, format: Format) -> Result<(), CusteioError> {
    let source = XlsxSheetSource::new(settings.workbook()?);
    let store = JsonFileStore::new(&settings.config.store);
    let response = custeio_core::sync_ingredient_prices(
        &settings.ctx,
        &source,
        &store,
        &SystemClock,
        &settings.config.quotations,
    )
    .await?;
    report(&response, format)
}

pub async fn recipes(settings: &Settings, format: Format) -> Result<(), CusteioError> {
    let source = XlsxSheetSource::new(settings.workbook()?);
    let store = JsonFileStore::new(&settings.config.store);
    let response = custeio_core::import_recipes(
        &settings.ctx,
        &source,
        &store,
        &SystemClock,
        &settings.config.recipes,
    )
    .await?;
    report(&response, format)
}

fn report(response: &SyncResponse, format: Format) -> Result<(), CusteioError> {
    match format {
        Format::Json => output::json::print(response),
        Format::Table => {
            println!("{}", response.message);
            Ok(())
        }
    }
}
