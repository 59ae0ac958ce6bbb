use std::path::PathBuf;

use custeio_core::error::CusteioError;
use custeio_core::extraction::xlsx::XlsxSheetSource;
use custeio_core::extraction::CellRange;
use custeio_core::extraction::SheetSource;
use custeio_core::parsing::{parse_quotation_sheet, parse_recipe_sheet};

use crate::output;
use crate::{Format, Settings, SheetKind};

/// Read and parse one sheet without touching the store.
pub async fn run(
    settings: &Settings,
    sheet: SheetKind,
    format: Format,
    output_file: Option<PathBuf>,
) -> Result<(), CusteioError> {
    let source = XlsxSheetSource::new(settings.workbook()?);
    let sheet_config = match sheet {
        SheetKind::Cotacoes => &settings.config.quotations,
        SheetKind::Receitas => &settings.config.recipes,
    };
    let first_row_number = CellRange::parse(&sheet_config.range)?.first_row_number();
    let rows = source
        .read_range(&sheet_config.sheet, &sheet_config.range)
        .await?;

    let (json, table, records, skipped) = match sheet {
        SheetKind::Cotacoes => {
            let parsed = parse_quotation_sheet(&rows, first_row_number)?;
            (
                serde_json::to_string_pretty(&parsed)?,
                output::table::format_parsed_quotations(&parsed),
                parsed.ingredients.len(),
                parsed.skipped_rows.len(),
            )
        }
        SheetKind::Receitas => {
            let parsed = parse_recipe_sheet(&rows, first_row_number)?;
            (
                serde_json::to_string_pretty(&parsed)?,
                output::table::format_parsed_recipes(&parsed),
                parsed.recipes.len(),
                parsed.skipped_rows.len(),
            )
        }
    };

    match output_file {
        Some(path) => {
            std::fs::write(&path, &json)?;
            eprintln!("Parsed {records} record(s), written to {}", path.display());
            if skipped > 0 {
                eprintln!("  {skipped} row(s) skipped during parsing");
            }
        }
        None => match format {
            Format::Json => println!("{json}"),
            Format::Table => print!("{table}"),
        },
    }

    Ok(())
}
