// ⚙️ Pipeline Configuration - input and output file names
//
// Defaults are the fixed file names the pipeline has always used. An optional
// JSON file can override any subset of them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Looked up in the working directory by the binary
pub const CONFIG_FILE: &str = "deal_pipeline.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // CSV pass
    pub deal_csv: PathBuf,
    pub country_csv: PathBuf,
    pub currency_csv: PathBuf,
    pub company_csv: PathBuf,

    // Workbook pass
    pub deal_workbook: PathBuf,
    pub lookup_workbook: PathBuf,
    pub country_sheet: String,
    pub currency_sheet: String,
    pub company_sheet: String,

    // Outputs
    pub output_csv: PathBuf,
    pub error_log: PathBuf,
    pub parquet_output: PathBuf,
    pub snapshot_db: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            deal_csv: PathBuf::from("Deal_List.csv"),
            country_csv: PathBuf::from("Country_List.csv"),
            currency_csv: PathBuf::from("Currency_List.csv"),
            company_csv: PathBuf::from("COMPANY_List.csv"),
            deal_workbook: PathBuf::from("Deal_List.xlsx"),
            lookup_workbook: PathBuf::from("Deal_List_Lookup_Codes.xlsx"),
            country_sheet: "Country".to_string(),
            currency_sheet: "Currency".to_string(),
            company_sheet: "Company".to_string(),
            output_csv: PathBuf::from("file_processing_pipline_output_csv.csv"),
            error_log: PathBuf::from("file_processing_pipline_output_err.txt"),
            parquet_output: PathBuf::from("file_processing_pipline_output_par.parquet"),
            snapshot_db: PathBuf::from("file_processing_pipline_output.db"),
        }
    }
}

impl PipelineConfig {
    /// Load overrides from a JSON file. Missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse pipeline config JSON")
    }

    /// Load the file if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Join every relative path onto `base`
    pub fn resolve(mut self, base: &Path) -> Self {
        for path in [
            &mut self.deal_csv,
            &mut self.country_csv,
            &mut self.currency_csv,
            &mut self.company_csv,
            &mut self.deal_workbook,
            &mut self.lookup_workbook,
            &mut self.output_csv,
            &mut self.error_log,
            &mut self.parquet_output,
            &mut self.snapshot_db,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_names() {
        let config = PipelineConfig::default();
        assert_eq!(config.deal_csv, PathBuf::from("Deal_List.csv"));
        assert_eq!(config.company_csv, PathBuf::from("COMPANY_List.csv"));
        assert_eq!(config.company_sheet, "Company");
        assert_eq!(
            config.error_log,
            PathBuf::from("file_processing_pipline_output_err.txt")
        );
        assert_eq!(
            config.parquet_output,
            PathBuf::from("file_processing_pipline_output_par.parquet")
        );
    }

    #[test]
    fn test_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "deal_csv": "deals_2025.csv", "company_sheet": "Companies" }"#)
            .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();

        assert_eq!(config.deal_csv, PathBuf::from("deals_2025.csv"));
        assert_eq!(config.company_sheet, "Companies");
        assert_eq!(config.country_csv, PathBuf::from("Country_List.csv"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load_or_default(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert!(PipelineConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_resolve_against_base() {
        let base = Path::new("/data/run");
        let mut config = PipelineConfig::default();
        config.snapshot_db = PathBuf::from("/tmp/out.db");

        let config = config.resolve(base);

        assert_eq!(config.deal_csv, base.join("Deal_List.csv"));
        assert_eq!(config.snapshot_db, PathBuf::from("/tmp/out.db"));
    }
}
