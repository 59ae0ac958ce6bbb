use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CusteioError;
use crate::extraction::CellRange;

/// Where a pipeline reads its rows from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConfig {
    pub sheet: String,
    /// A1-notation range, header row included.
    pub range: String,
}

impl SheetConfig {
    pub fn quotations() -> Self {
        Self {
            sheet: "Cotacoes".into(),
            range: "A:M".into(),
        }
    }

    pub fn recipes() -> Self {
        Self {
            sheet: "Receitas".into(),
            range: "A:H".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Spreadsheet file holding both sheets.
    #[serde(default)]
    pub workbook: Option<PathBuf>,
    #[serde(default = "default_store")]
    pub store: PathBuf,
    #[serde(default = "SheetConfig::quotations")]
    pub quotations: SheetConfig,
    #[serde(default = "SheetConfig::recipes")]
    pub recipes: SheetConfig,
}

fn default_store() -> PathBuf {
    PathBuf::from("custeio-store.json")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workbook: None,
            store: default_store(),
            quotations: SheetConfig::quotations(),
            recipes: SheetConfig::recipes(),
        }
    }
}

/// Load a config from a JSON file.
pub fn load_config(path: &Path) -> Result<SyncConfig, CusteioError> {
    let content = std::fs::read_to_string(path).map_err(|e| CusteioError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: SyncConfig = serde_json::from_str(&content).map_err(|e| CusteioError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &SyncConfig) -> Result<(), CusteioError> {
    for (label, sheet) in [("quotations", &config.quotations), ("recipes", &config.recipes)] {
        if sheet.sheet.trim().is_empty() {
            return Err(CusteioError::ConfigInvalid(format!(
                "{label}: sheet name must not be empty"
            )));
        }
        CellRange::parse(&sheet.range)
            .map_err(|e| CusteioError::ConfigInvalid(format!("{label}: {e}")))?;
    }
    if config.store.as_os_str().is_empty() {
        return Err(CusteioError::ConfigInvalid("store path must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: SyncConfig = serde_json::from_str(r#"{"workbook": "planilha.xlsx"}"#).unwrap();
        assert_eq!(config.workbook, Some(PathBuf::from("planilha.xlsx")));
        assert_eq!(config.store, PathBuf::from("custeio-store.json"));
        assert_eq!(config.quotations, SheetConfig::quotations());
        assert_eq!(config.recipes.range, "A:H");
        validate_config(&config).unwrap();
    }

    #[test]
    fn test_bad_range_rejected() {
        let mut config = SyncConfig::default();
        config.recipes.range = "Receitas!A:H".into();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, CusteioError::ConfigInvalid(ref m) if m.starts_with("recipes")));
    }

    #[test]
    fn test_blank_sheet_rejected() {
        let mut config = SyncConfig::default();
        config.quotations.sheet = "  ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/custeio.json")).unwrap_err();
        assert!(matches!(err, CusteioError::ConfigLoad { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custeio.json");
        std::fs::write(
            &path,
            r#"{"store": "dados.json", "quotations": {"sheet": "Precos", "range": "A2:M"}}"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.quotations.sheet, "Precos");
        assert_eq!(config.store, PathBuf::from("dados.json"));
    }
}
