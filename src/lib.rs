// Deal Pipeline - Core Library
// Validates and reconciles deal records against country, currency and
// company catalogs, then writes the enriched rows and an error log.

pub mod catalog;
pub mod columnar;
pub mod config;
pub mod data_quality;
pub mod db;
pub mod deal;
pub mod environment;
pub mod hashing;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod reconciliation;
pub mod report;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogKind, Catalogs, ReferenceEntry};
pub use columnar::{output_schema, rows_to_batch, write_columnar_snapshot};
pub use config::{PipelineConfig, CONFIG_FILE};
pub use data_quality::{DataQualityEngine, Rule, ValidationOutcome};
pub use db::{load_output_csv, setup_database, verify_count, write_snapshot};
pub use deal::{DealRecord, EnrichedRecord, OutputRow, DECIMAL_COLUMNS, OUTPUT_HEADER};
pub use environment::{EnvironmentProvider, FixedEnvironment, RunStamp, SystemEnvironment};
pub use hashing::{row_hash, stamp_hashes};
pub use output::{CsvOutputWriter, DiagnosticsSink, OutputSink, RunOutputs, TextDiagnosticsSink};
pub use parser::{
    get_loader, BatchLoader, BatchOrigin, CsvBatchLoader, DealBatch, RawTable,
    WorkbookBatchLoader,
};
pub use pipeline::{process_batch, run, run_pass, PassSummary, PipelineContext, RunSummary};
pub use reconciliation::{ReconciliationEngine, ReconciliationReport};
pub use report::{Diagnostic, ErrorReporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
