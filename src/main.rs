use anyhow::Result;
use std::env;

use deal_pipeline::{run, PipelineConfig, SystemEnvironment, CONFIG_FILE, VERSION};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("📑 Deal Pipeline v{} - validate, reconcile, stamp", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // File names are relative to the working directory
    let base = env::current_dir()?;
    let config = PipelineConfig::load_or_default(base.join(CONFIG_FILE))?.resolve(&base);

    println!("\n📂 Processing CSV files, then EXCEL files...");
    let summary = run(&config, &SystemEnvironment)?;

    for pass in &summary.passes {
        println!("✓ {}", pass.summary());
    }

    println!("\n💾 Outputs");
    println!("✓ Rows:        {} ({})", summary.total_rows(), config.output_csv.display());
    println!("✓ Diagnostics: {} ({})", summary.total_diagnostics(), config.error_log.display());
    println!("✓ Parquet:     {} rows ({})", summary.columnar_rows, config.parquet_output.display());
    println!("✓ Snapshot:    {} rows ({})", summary.snapshot_rows, config.snapshot_db.display());

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Run {} complete", summary.run_id);

    Ok(())
}
