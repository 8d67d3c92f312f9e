// 🔄 Pipeline - one pass = load → hash → reconcile → validate → report
//
// Each pass builds a fresh context (stamp, diagnostics), so nothing from the
// CSV pass leaks into the workbook pass. Both passes share the same output
// and diagnostics sinks for the lifetime of a run.

use crate::columnar::write_columnar_snapshot;
use crate::config::PipelineConfig;
use crate::data_quality::DataQualityEngine;
use crate::db::write_snapshot;
use crate::deal::OutputRow;
use crate::environment::{EnvironmentProvider, RunStamp};
use crate::hashing::stamp_hashes;
use crate::output::{DiagnosticsSink, OutputSink, RunOutputs};
use crate::parser::{get_loader, BatchLoader, BatchOrigin, DealBatch};
use crate::reconciliation::ReconciliationEngine;
use crate::report::ErrorReporter;
use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// PIPELINE CONTEXT
// ============================================================================

/// State owned by a single pass
#[derive(Debug)]
pub struct PipelineContext {
    pub pass_id: Uuid,
    pub origin: BatchOrigin,
    pub stamp: RunStamp,
    pub reporter: ErrorReporter,
}

impl PipelineContext {
    pub fn new(origin: BatchOrigin, env: &dyn EnvironmentProvider) -> Self {
        PipelineContext {
            pass_id: Uuid::new_v4(),
            origin,
            stamp: env.stamp(),
            reporter: ErrorReporter::new(),
        }
    }
}

// ============================================================================
// SUMMARIES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub origin: BatchOrigin,
    pub pass_id: Uuid,
    /// Deals loaded
    pub records: usize,
    /// Rows written (more than `records` when catalogs repeat a key)
    pub output_rows: usize,
    pub diagnostics: usize,
    pub rows_with_diagnostics: usize,
}

impl PassSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} pass: {} deals → {} rows, {} diagnostics on {} rows",
            self.origin.name(),
            self.records,
            self.output_rows,
            self.diagnostics,
            self.rows_with_diagnostics
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub passes: Vec<PassSummary>,
    /// Rows in the parquet file
    pub columnar_rows: usize,
    /// Rows in the SQLite snapshot
    pub snapshot_rows: usize,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.passes.iter().map(|p| p.output_rows).sum()
    }

    pub fn total_diagnostics(&self) -> usize {
        self.passes.iter().map(|p| p.diagnostics).sum()
    }
}

// ============================================================================
// PASS
// ============================================================================

/// Core of a pass, after loading. Never fails: data problems become
/// diagnostics in `ctx.reporter`.
pub fn process_batch(ctx: &mut PipelineContext, batch: DealBatch) -> Vec<OutputRow> {
    let DealBatch {
        mut deals,
        catalogs,
    } = batch;

    // Hash before any enrichment column exists
    stamp_hashes(&mut deals);

    for catalog in catalogs.iter() {
        let duplicates = catalog.duplicate_codes();
        if !duplicates.is_empty() {
            tracing::warn!(
                "{} catalog repeats keys {:?}; matching deals will be duplicated",
                catalog.kind().as_str(),
                duplicates
            );
        }
    }

    let report = ReconciliationEngine::new().reconcile(&deals, &catalogs);
    tracing::info!("{}", report.summary());

    DataQualityEngine::new(ctx.stamp).validate_batch(&report.records, &mut ctx.reporter)
}

/// Run one full pass and write its rows and diagnostics
pub fn run_pass(
    loader: &dyn BatchLoader,
    env: &dyn EnvironmentProvider,
    rows_out: &mut dyn OutputSink,
    diagnostics_out: &mut dyn DiagnosticsSink,
) -> Result<PassSummary> {
    let mut ctx = PipelineContext::new(loader.origin(), env);
    tracing::info!(
        "Starting {} pass {} (as of {}, pid {})",
        ctx.origin.name(),
        ctx.pass_id,
        ctx.stamp.as_of_date,
        ctx.stamp.process_id
    );

    let batch = loader.load_batch()?;
    let records = batch.deals.len();

    let rows = process_batch(&mut ctx, batch);

    rows_out.write_rows(&rows)?;
    diagnostics_out.write_diagnostics(&ctx.reporter.render_lines())?;

    let summary = PassSummary {
        origin: ctx.origin,
        pass_id: ctx.pass_id,
        records,
        output_rows: rows.len(),
        diagnostics: ctx.reporter.len(),
        rows_with_diagnostics: ctx.reporter.rows_with_diagnostics(),
    };
    tracing::info!("{}", summary.summary());

    Ok(summary)
}

// ============================================================================
// RUN
// ============================================================================

/// Both passes in order (CSV, then workbook), then the parquet file and the
/// SQLite snapshot
pub fn run(config: &PipelineConfig, env: &dyn EnvironmentProvider) -> Result<RunSummary> {
    run_origins(config, env, &[BatchOrigin::Csv, BatchOrigin::Workbook])
}

/// Run the given passes in order against shared output files
pub fn run_origins(
    config: &PipelineConfig,
    env: &dyn EnvironmentProvider,
    origins: &[BatchOrigin],
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();

    let mut outputs = RunOutputs::create(config)?;

    let mut passes = Vec::with_capacity(origins.len());
    for &origin in origins {
        let loader = get_loader(origin, config);
        passes.push(run_pass(
            loader.as_ref(),
            env,
            &mut outputs.rows,
            &mut outputs.diagnostics,
        )?);
    }

    let (rows_written, lines_written) = outputs.finish()?;
    tracing::info!(
        "Run {}: {} rows, {} diagnostic lines",
        run_id,
        rows_written,
        lines_written
    );

    let columnar_rows = write_columnar_snapshot(&config.output_csv, &config.parquet_output)?;
    let snapshot_rows = write_snapshot(&config.output_csv, &config.snapshot_db, &run_id.to_string())?;

    Ok(RunSummary {
        run_id,
        passes,
        columnar_rows,
        snapshot_rows,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogKind, Catalogs, ReferenceEntry};
    use crate::data_quality::Rule;
    use crate::deal::DealRecord;
    use crate::environment::FixedEnvironment;
    use crate::hashing::row_hash;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;

    struct StaticLoader {
        batch: DealBatch,
        origin: BatchOrigin,
    }

    impl BatchLoader for StaticLoader {
        fn load_batch(&self) -> Result<DealBatch> {
            Ok(self.batch.clone())
        }

        fn origin(&self) -> BatchOrigin {
            self.origin
        }
    }

    fn create_env() -> FixedEnvironment {
        FixedEnvironment::new(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(), 1001)
    }

    fn create_catalogs() -> Catalogs {
        Catalogs::new(
            Catalog::from_entries(CatalogKind::Country, vec![ReferenceEntry::new("US", "United States")]),
            Catalog::from_entries(CatalogKind::Currency, vec![ReferenceEntry::new("USD", "US Dollar")]),
            Catalog::from_entries(CatalogKind::Company, vec![ReferenceEntry::new("5", "Acme")]),
        )
    }

    fn create_batch() -> DealBatch {
        DealBatch {
            deals: vec![
                DealRecord::new(0)
                    .with_deal_name("Valid")
                    .with_decimals(["1", "2", "3", "4", "5"])
                    .with_is_active("yes")
                    .with_codes("US", "USD", "5"),
                DealRecord::new(1)
                    .with_deal_name("")
                    .with_decimals(["10", "", "", "", ""])
                    .with_is_active("maybe")
                    .with_codes("FR", "USD", "5"),
            ],
            catalogs: create_catalogs(),
        }
    }

    #[test]
    fn test_process_batch_rows_and_diagnostics() {
        let env = create_env();
        let mut ctx = PipelineContext::new(BatchOrigin::Csv, &env);
        let batch = create_batch();
        let expected_hash = row_hash(&batch.deals[1]);

        let rows = process_batch(&mut ctx, batch);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company_name, "Acme");
        assert_eq!(rows[1].row_no, 2);
        assert_eq!(rows[1].row_hash, expected_hash);
        assert!(rows.iter().all(|r| r.process_identifier == 1001));

        let diagnostics = ctx.reporter.diagnostics();
        assert!(diagnostics.iter().all(|d| d.row_number == 2));
        let rules: Vec<Rule> = diagnostics.iter().map(|d| d.rule).collect();
        assert_eq!(
            rules,
            vec![
                Rule::DealNameRequired,
                Rule::DecimalFormat,
                Rule::DecimalFormat,
                Rule::DecimalFormat,
                Rule::DecimalFormat,
                Rule::IsActiveFlag,
                Rule::CountryMatch,
            ]
        );
    }

    #[test]
    fn test_duplicate_catalog_key_amplifies_output() {
        let env = create_env();
        let mut ctx = PipelineContext::new(BatchOrigin::Csv, &env);
        let mut batch = create_batch();
        batch.catalogs.country.insert(ReferenceEntry::new("US", "USA"));

        let rows = process_batch(&mut ctx, batch);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].row_no, 1);
        assert_eq!(rows[1].row_no, 1);
        assert_eq!(rows[0].row_hash, rows[1].row_hash);
    }

    #[test]
    fn test_passes_do_not_share_diagnostics() {
        let env = create_env();
        let csv = StaticLoader { batch: create_batch(), origin: BatchOrigin::Csv };
        let workbook = StaticLoader { batch: create_batch(), origin: BatchOrigin::Workbook };

        let mut rows: Vec<OutputRow> = Vec::new();
        let mut lines: Vec<String> = Vec::new();

        let first = run_pass(&csv, &env, &mut rows, &mut lines).unwrap();
        let second = run_pass(&workbook, &env, &mut rows, &mut lines).unwrap();

        assert_eq!(first.diagnostics, 7);
        assert_eq!(second.diagnostics, 7);
        assert_ne!(first.pass_id, second.pass_id);
        assert_eq!(rows.len(), 4);
        // Each pass appends only its own lines
        assert_eq!(lines.len(), 14);
        assert_eq!(lines[..7], lines[7..]);
        assert_eq!(first.rows_with_diagnostics, 1);
    }

    fn write_csv_inputs(dir: &Path) {
        fs::write(
            dir.join("Deal_List.csv"),
            "Deal Name,D1,D2,D3,D4,D5,Is Active,Country,Currency,Company\n\
             Alpha,10,0,0,0,0,Yes,US,USD,5\n\
             ,0,0,0,0,0,No,,,\n",
        )
        .unwrap();
        fs::write(dir.join("Country_List.csv"), "Code,Name\nUS,United States\n").unwrap();
        fs::write(dir.join("Currency_List.csv"), "Code,Name\nUSD,US Dollar\n").unwrap();
        fs::write(dir.join("COMPANY_List.csv"), "Id,Name\n5,Acme\n").unwrap();
    }

    #[test]
    fn test_csv_run_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        write_csv_inputs(dir.path());
        let config = PipelineConfig::default().resolve(dir.path());

        let summary = run_origins(&config, &create_env(), &[BatchOrigin::Csv]).unwrap();

        assert_eq!(summary.passes.len(), 1);
        assert_eq!(summary.total_rows(), 2);
        assert_eq!(summary.columnar_rows, 2);
        assert_eq!(summary.snapshot_rows, 2);

        let output = fs::read_to_string(&config.output_csv).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ROW_NO,Deal Name"));
        assert!(lines[1].starts_with("1,Alpha,10,0,0,0,0,Yes,US,USD,5,Acme,2025-02-28,1001,"));
        assert!(lines[2].starts_with("2,,0,0,0,0,0,No,,,,,2025-02-28,1001,"));

        let errors = fs::read_to_string(&config.error_log).unwrap();
        assert_eq!(
            errors.lines().collect::<Vec<_>>(),
            vec![
                "ROW_NO: 000002: Column: Deal Name Value: \"\" - Missing Deal Name, it is a Mandatory column.",
                "ROW_NO: 000002: - D1-D5 are all empty/invalid, need atleast one Decimal value",
                "ROW_NO: 000002: Column: COMPANY Value: \"\" - invalid/missing Currency code",
                "ROW_NO: 000002: COMPANY, CURRENCY and CURRENCY are mandatory fields",
            ]
        );

        assert!(config.snapshot_db.exists());
        assert!(config.parquet_output.exists());
    }

    fn write_workbook_inputs(dir: &Path) {
        use rust_xlsxwriter::Workbook;

        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            let header = [
                "Deal Name", "D1", "D2", "D3", "D4", "D5", "Is Active", "Country", "Currency",
                "Company",
            ];
            for (col, name) in header.iter().enumerate() {
                sheet.write_string(0, col as u16, *name).unwrap();
            }
            for (i, (name, d1, active, country)) in
                [("Beta", 7.0, "No", "US"), ("Gamma", 3.0, "Yes", "XX")].iter().enumerate()
            {
                let row = i as u32 + 1;
                sheet.write_string(row, 0, *name).unwrap();
                sheet.write_number(row, 1, *d1).unwrap();
                for col in 2..6 {
                    sheet.write_number(row, col, 0.0).unwrap();
                }
                sheet.write_string(row, 6, *active).unwrap();
                sheet.write_string(row, 7, *country).unwrap();
                sheet.write_string(row, 8, "USD").unwrap();
                sheet.write_number(row, 9, 5.0).unwrap();
            }
        }
        workbook.save(dir.join("Deal_List.xlsx")).unwrap();

        let mut workbook = Workbook::new();
        for (sheet_name, key, code, name) in [
            ("Country", "Code", "US", "United States"),
            ("Currency", "Code", "USD", "US Dollar"),
            ("Company", "Id", "5", "Acme"),
        ] {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name).unwrap();
            sheet.write_string(0, 0, key).unwrap();
            sheet.write_string(0, 1, "Name").unwrap();
            if key == "Id" {
                sheet.write_number(1, 0, code.parse::<f64>().unwrap()).unwrap();
            } else {
                sheet.write_string(1, 0, code).unwrap();
            }
            sheet.write_string(1, 1, name).unwrap();
        }
        workbook.save(dir.join("Deal_List_Lookup_Codes.xlsx")).unwrap();
    }

    #[test]
    fn test_full_run_appends_both_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_csv_inputs(dir.path());
        write_workbook_inputs(dir.path());
        let config = PipelineConfig::default().resolve(dir.path());

        let summary = run(&config, &create_env()).unwrap();

        assert_eq!(summary.passes.len(), 2);
        assert_eq!(summary.passes[0].origin, BatchOrigin::Csv);
        assert_eq!(summary.passes[1].origin, BatchOrigin::Workbook);
        assert_eq!(summary.total_rows(), 4);
        assert_eq!(summary.total_diagnostics(), 5);
        assert_eq!(summary.columnar_rows, 4);
        assert_eq!(summary.snapshot_rows, 4);

        // One header, CSV rows then workbook rows, numbering restarts per pass
        let output = fs::read_to_string(&config.output_csv).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines.iter().filter(|l| l.starts_with("ROW_NO,")).count(), 1);
        assert!(lines[1].starts_with("1,Alpha,10,0,0,0,0,Yes,US,USD,5,Acme,2025-02-28,1001,"));
        assert!(lines[2].starts_with("2,,0,0,0,0,0,No,,,,,2025-02-28,1001,"));
        assert!(lines[3].starts_with("1,Beta,7,0,0,0,0,No,US,USD,5,Acme,2025-02-28,1001,"));
        assert!(lines[4].starts_with("2,Gamma,3,0,0,0,0,Yes,XX,USD,5,Acme,2025-02-28,1001,"));

        let errors = fs::read_to_string(&config.error_log).unwrap();
        assert_eq!(
            errors.lines().collect::<Vec<_>>(),
            vec![
                "ROW_NO: 000002: Column: Deal Name Value: \"\" - Missing Deal Name, it is a Mandatory column.",
                "ROW_NO: 000002: - D1-D5 are all empty/invalid, need atleast one Decimal value",
                "ROW_NO: 000002: Column: COMPANY Value: \"\" - invalid/missing Currency code",
                "ROW_NO: 000002: COMPANY, CURRENCY and CURRENCY are mandatory fields",
                "ROW_NO: 000002: Column: Country Value: \"XX\" - invalid/missing Country code",
            ]
        );

        let bytes = fs::read(&config.parquet_output).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");
        let conn = rusqlite::Connection::open(&config.snapshot_db).unwrap();
        assert_eq!(crate::db::verify_count(&conn).unwrap(), 4);
        println!("✅ Two passes: {} rows, {} diagnostics", summary.total_rows(), summary.total_diagnostics());
    }

    #[test]
    fn test_run_fails_when_input_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default().resolve(dir.path());

        assert!(run(&config, &create_env()).is_err());
    }
}
