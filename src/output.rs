// 💾 Output - row file and diagnostics file
//
// The row file gets its header once and then rows from every pass, in order.
// The diagnostics file is plain text, one rendered diagnostic per line.

use crate::config::PipelineConfig;
use crate::deal::{OutputRow, OUTPUT_HEADER};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// ============================================================================
// SINK TRAITS
// ============================================================================

/// Destination for normalized output rows
pub trait OutputSink {
    fn write_rows(&mut self, rows: &[OutputRow]) -> Result<()>;
}

/// Destination for rendered diagnostic lines
pub trait DiagnosticsSink {
    fn write_diagnostics(&mut self, lines: &[String]) -> Result<()>;
}

// In-memory sinks, used when a caller wants the results directly

impl OutputSink for Vec<OutputRow> {
    fn write_rows(&mut self, rows: &[OutputRow]) -> Result<()> {
        self.extend_from_slice(rows);
        Ok(())
    }
}

impl DiagnosticsSink for Vec<String> {
    fn write_diagnostics(&mut self, lines: &[String]) -> Result<()> {
        self.extend_from_slice(lines);
        Ok(())
    }
}

// ============================================================================
// CSV OUTPUT WRITER
// ============================================================================

pub struct CsvOutputWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: usize,
}

impl CsvOutputWriter<File> {
    /// Create (truncate) the output file and write the header
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        tracing::debug!("Writing output rows to {}", path.display());
        Self::new(file)
    }
}

impl<W: Write> CsvOutputWriter<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer
            .write_record(OUTPUT_HEADER)
            .context("Failed to write output header")?;

        Ok(CsvOutputWriter {
            writer,
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush output rows: {}", e.error()))
    }
}

impl<W: Write> OutputSink for CsvOutputWriter<W> {
    fn write_rows(&mut self, rows: &[OutputRow]) -> Result<()> {
        for row in rows {
            self.writer
                .serialize(row)
                .with_context(|| format!("Failed to write output row {}", row.row_no))?;
            self.rows_written += 1;
        }
        self.writer.flush().context("Failed to flush output rows")?;
        Ok(())
    }
}

// ============================================================================
// TEXT DIAGNOSTICS SINK
// ============================================================================

pub struct TextDiagnosticsSink<W: Write> {
    writer: BufWriter<W>,
    lines_written: usize,
}

impl TextDiagnosticsSink<File> {
    /// Create (truncate) the diagnostics file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create error file: {}", path.display()))?;
        tracing::debug!("Writing diagnostics to {}", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> TextDiagnosticsSink<W> {
    pub fn new(inner: W) -> Self {
        TextDiagnosticsSink {
            writer: BufWriter::new(inner),
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush diagnostics: {}", e.error()))
    }
}

impl<W: Write> DiagnosticsSink for TextDiagnosticsSink<W> {
    fn write_diagnostics(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            writeln!(self.writer, "{}", line).context("Failed to write diagnostic line")?;
            self.lines_written += 1;
        }
        self.writer.flush().context("Failed to flush diagnostics")?;
        Ok(())
    }
}

// ============================================================================
// RUN OUTPUTS
// ============================================================================

/// The two text files of one run, opened once and shared by every pass
pub struct RunOutputs {
    pub rows: CsvOutputWriter<File>,
    pub diagnostics: TextDiagnosticsSink<File>,
}

impl RunOutputs {
    pub fn create(config: &PipelineConfig) -> Result<Self> {
        Ok(RunOutputs {
            rows: CsvOutputWriter::create(&config.output_csv)?,
            diagnostics: TextDiagnosticsSink::create(&config.error_log)?,
        })
    }

    /// Flush both files. Returns (rows written, diagnostic lines written).
    pub fn finish(self) -> Result<(usize, usize)> {
        let rows = self.rows.rows_written();
        let lines = self.diagnostics.lines_written();
        self.rows.finish()?;
        self.diagnostics.finish()?;
        Ok((rows, lines))
    }
}

// ============================================================================
// TESTS
// ============================================================================
