// 🏗️ Batch Loaders - CSV and workbook input
//
// Both loaders produce the same thing: an ordered deal batch plus the three
// catalogs. Everything downstream is shared between the two passes.

use crate::catalog::{Catalog, CatalogKind, Catalogs, ReferenceEntry};
use crate::config::PipelineConfig;
use crate::deal::{DealRecord, DECIMAL_COLUMNS};
use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Deal columns read from the input, besides D1..D5
pub const DEAL_NAME_COLUMN: &str = "Deal Name";
pub const IS_ACTIVE_COLUMN: &str = "Is Active";
pub const COUNTRY_COLUMN: &str = "Country";
pub const CURRENCY_COLUMN: &str = "Currency";
pub const COMPANY_COLUMN: &str = "Company";

// ============================================================================
// CORE TYPES
// ============================================================================

/// Where a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOrigin {
    Csv,
    Workbook,
}

impl BatchOrigin {
    pub fn name(&self) -> &str {
        match self {
            BatchOrigin::Csv => "CSV",
            BatchOrigin::Workbook => "EXCEL",
        }
    }
}

/// Uniform in-memory table: a header row and ordered rows of text cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Where the table was read from, for error messages
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable {
            source: source.to_string(),
            headers,
            rows,
        }
    }

    /// Position of a column by exact header name
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Missing column '{}' in {}", name, self.source))
    }

    /// Cell text, empty when the row is shorter than the header
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What a loader hands to the pipeline
#[derive(Debug, Clone)]
pub struct DealBatch {
    /// In source order; position = row index
    pub deals: Vec<DealRecord>,
    pub catalogs: Catalogs,
}

// ============================================================================
// LOADER TRAIT
// ============================================================================

/// Source of one pass worth of input
pub trait BatchLoader {
    /// Read the deal batch and its three catalogs
    fn load_batch(&self) -> Result<DealBatch>;

    fn origin(&self) -> BatchOrigin;
}

// ============================================================================
// TABLE → RECORDS
// ============================================================================

/// Map a deal table to records. Row order becomes the row index.
pub fn deals_from_table(table: &RawTable) -> Result<Vec<DealRecord>> {
    let name_col = table.column(DEAL_NAME_COLUMN)?;
    let decimal_cols = DECIMAL_COLUMNS
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<Vec<usize>>>()?;
    let active_col = table.column(IS_ACTIVE_COLUMN)?;
    let country_col = table.column(COUNTRY_COLUMN)?;
    let currency_col = table.column(CURRENCY_COLUMN)?;
    let company_col = table.column(COMPANY_COLUMN)?;

    let deals = (0..table.len())
        .map(|row| {
            let mut deal = DealRecord::new(row);
            deal.deal_name = table.cell(row, name_col).to_string();
            for (slot, &col) in decimal_cols.iter().enumerate() {
                deal.decimal_fields[slot] = table.cell(row, col).to_string();
            }
            deal.is_active = table.cell(row, active_col).to_string();
            deal.country_code = table.cell(row, country_col).to_string();
            deal.currency_code = table.cell(row, currency_col).to_string();
            deal.company_code = table.cell(row, company_col).to_string();
            deal
        })
        .collect();

    Ok(deals)
}

/// Map a (key, name) table to a catalog
pub fn catalog_from_table(kind: CatalogKind, table: &RawTable) -> Result<Catalog> {
    let key_col = table.column(kind.key_column())?;
    let name_col = table.column(kind.name_column())?;

    let entries = (0..table.len())
        .map(|row| ReferenceEntry::new(table.cell(row, key_col), table.cell(row, name_col)))
        .collect();

    Ok(Catalog::from_entries(kind, entries))
}

// ============================================================================
// CSV LOADER
// ============================================================================

/// Read a CSV file with a header row
pub fn read_csv_table(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(clean_header)
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    Ok(RawTable::new(&path.display().to_string(), headers, rows))
}

pub struct CsvBatchLoader {
    pub deals: PathBuf,
    pub country: PathBuf,
    pub currency: PathBuf,
    pub company: PathBuf,
}

impl CsvBatchLoader {
    pub fn from_config(config: &PipelineConfig) -> Self {
        CsvBatchLoader {
            deals: config.deal_csv.clone(),
            country: config.country_csv.clone(),
            currency: config.currency_csv.clone(),
            company: config.company_csv.clone(),
        }
    }
}

impl BatchLoader for CsvBatchLoader {
    fn load_batch(&self) -> Result<DealBatch> {
        let catalogs = Catalogs::new(
            catalog_from_table(CatalogKind::Country, &read_csv_table(&self.country)?)?,
            catalog_from_table(CatalogKind::Currency, &read_csv_table(&self.currency)?)?,
            catalog_from_table(CatalogKind::Company, &read_csv_table(&self.company)?)?,
        );
        let deals = deals_from_table(&read_csv_table(&self.deals)?)?;

        Ok(DealBatch { deals, catalogs })
    }

    fn origin(&self) -> BatchOrigin {
        BatchOrigin::Csv
    }
}

// ============================================================================
// WORKBOOK LOADER
// ============================================================================

/// Read one worksheet; `None` means the first sheet of the workbook.
/// The first row is the header.
pub fn read_sheet_table(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook {} contains no sheets", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{}' in {}", sheet_name, path.display()))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| clean_header(&cell_text(c))).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let source = format!("{} [{}]", path.display(), sheet_name);
    Ok(RawTable::new(&source, headers, rows))
}

/// Render a workbook cell the way it would appear in a CSV export
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integral values without a fraction: 5.0 → "5"
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        // Formula errors are not values
        Data::Error(_) => "#ERR".to_string(),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

pub struct WorkbookBatchLoader {
    pub deals: PathBuf,
    pub lookups: PathBuf,
    pub country_sheet: String,
    pub currency_sheet: String,
    pub company_sheet: String,
}

impl WorkbookBatchLoader {
    pub fn from_config(config: &PipelineConfig) -> Self {
        WorkbookBatchLoader {
            deals: config.deal_workbook.clone(),
            lookups: config.lookup_workbook.clone(),
            country_sheet: config.country_sheet.clone(),
            currency_sheet: config.currency_sheet.clone(),
            company_sheet: config.company_sheet.clone(),
        }
    }
}

impl BatchLoader for WorkbookBatchLoader {
    fn load_batch(&self) -> Result<DealBatch> {
        let lookup = |kind: CatalogKind, sheet: &str| -> Result<Catalog> {
            catalog_from_table(kind, &read_sheet_table(&self.lookups, Some(sheet))?)
        };

        let catalogs = Catalogs::new(
            lookup(CatalogKind::Country, &self.country_sheet)?,
            lookup(CatalogKind::Currency, &self.currency_sheet)?,
            lookup(CatalogKind::Company, &self.company_sheet)?,
        );
        let deals = deals_from_table(&read_sheet_table(&self.deals, None)?)?;

        Ok(DealBatch { deals, catalogs })
    }

    fn origin(&self) -> BatchOrigin {
        BatchOrigin::Workbook
    }
}

// ============================================================================
// FACTORY
// ============================================================================

/// Loader for a batch origin, wired to the configured files
pub fn get_loader(origin: BatchOrigin, config: &PipelineConfig) -> Box<dyn BatchLoader> {
    match origin {
        BatchOrigin::Csv => Box::new(CsvBatchLoader::from_config(config)),
        BatchOrigin::Workbook => Box::new(WorkbookBatchLoader::from_config(config)),
    }
}

/// Strip a UTF-8 BOM and surrounding whitespace from a header cell
fn clean_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_string()
}

// ============================================================================
// TESTS
// ============================================================================
