// 🗄️ Output Snapshot - the written row file, re-stored as SQLite
//
// Second writer of the run: after both passes are flushed, the row file is
// read back and loaded into a binary table store (WAL mode). Every field in
// the row file is string- or number-representable, so the trip through text
// loses nothing the snapshot needs.

use crate::deal::OutputRow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::path::Path;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS deal_output (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            row_no INTEGER NOT NULL,
            deal_name TEXT NOT NULL,
            d1 TEXT NOT NULL,
            d2 TEXT NOT NULL,
            d3 TEXT NOT NULL,
            d4 TEXT NOT NULL,
            d5 TEXT NOT NULL,
            is_active TEXT NOT NULL,
            country TEXT NOT NULL,
            currency TEXT NOT NULL,
            company TEXT NOT NULL,
            company_name TEXT NOT NULL,
            as_of_date TEXT NOT NULL,
            process_identifier INTEGER NOT NULL,
            row_hash TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_deal_output_hash ON deal_output(row_hash)",
        [],
    )?;

    Ok(())
}

/// Read a row file written by `CsvOutputWriter`
pub fn load_output_csv(csv_path: &Path) -> Result<Vec<OutputRow>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open output file: {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: OutputRow = result.context("Failed to deserialize output row")?;
        rows.push(row);
    }

    Ok(rows)
}

/// Replace the snapshot contents with `rows`, inside one transaction
pub fn replace_output_rows(conn: &mut Connection, rows: &[OutputRow], run_id: &str) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM deal_output", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO deal_output (
                run_id, row_no, deal_name, d1, d2, d3, d4, d5, is_active,
                country, currency, company, company_name, as_of_date,
                process_identifier, row_hash
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )?;

        for row in rows {
            stmt.execute(params![
                run_id,
                row.row_no as i64,
                row.deal_name,
                row.d1,
                row.d2,
                row.d3,
                row.d4,
                row.d5,
                row.is_active,
                row.country,
                row.currency,
                row.company,
                row.company_name,
                row.as_of_date.to_string(),
                row.process_identifier,
                // u64 does not fit SQLite's signed integer
                row.row_hash.to_string(),
            ])?;
        }
    }

    tx.commit()?;
    Ok(rows.len())
}

pub fn get_output_rows(conn: &Connection) -> Result<Vec<OutputRow>> {
    let mut stmt = conn.prepare(
        "SELECT row_no, deal_name, d1, d2, d3, d4, d5, is_active, country, currency,
                company, company_name, as_of_date, process_identifier, row_hash
         FROM deal_output
         ORDER BY id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let row_no: i64 = row.get(0)?;
            let as_of_date: String = row.get(12)?;
            let row_hash: String = row.get(14)?;

            Ok(OutputRow {
                row_no: row_no as usize,
                deal_name: row.get(1)?,
                d1: row.get(2)?,
                d2: row.get(3)?,
                d3: row.get(4)?,
                d4: row.get(5)?,
                d5: row.get(6)?,
                is_active: row.get(7)?,
                country: row.get(8)?,
                currency: row.get(9)?,
                company: row.get(10)?,
                company_name: row.get(11)?,
                as_of_date: NaiveDate::parse_from_str(&as_of_date, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e))
                })?,
                process_identifier: row.get(13)?,
                row_hash: row_hash.parse::<u64>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(14, Type::Text, Box::new(e))
                })?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM deal_output", [], |row| row.get(0))?;

    Ok(count)
}

/// Load the row file into the snapshot database. Returns rows stored.
pub fn write_snapshot(csv_path: &Path, db_path: &Path, run_id: &str) -> Result<usize> {
    let rows = load_output_csv(csv_path)?;

    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open snapshot database: {}", db_path.display()))?;
    setup_database(&conn)?;

    let stored = replace_output_rows(&mut conn, &rows, run_id)?;
    tracing::debug!("Stored {} rows in {}", stored, db_path.display());

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CsvOutputWriter, OutputSink};

    fn create_row(row_no: usize, hash: u64) -> OutputRow {
        OutputRow {
            row_no,
            deal_name: format!("Deal {}", row_no),
            d1: "1".to_string(),
            d2: "".to_string(),
            d3: "".to_string(),
            d4: "".to_string(),
            d5: "x".to_string(),
            is_active: "No".to_string(),
            country: "IN".to_string(),
            currency: "INR".to_string(),
            company: "2".to_string(),
            company_name: "Globex".to_string(),
            as_of_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            process_identifier: 99,
            row_hash: hash,
        }
    }

    #[test]
    fn test_snapshot_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        let db_path = dir.path().join("out.db");

        let rows = vec![create_row(1, u64::MAX), create_row(2, 7), create_row(1, 0)];
        let mut writer = CsvOutputWriter::create(&csv_path).unwrap();
        writer.write_rows(&rows).unwrap();
        writer.finish().unwrap();

        let stored = write_snapshot(&csv_path, &db_path, "run-1").unwrap();
        assert_eq!(stored, 3);

        let conn = Connection::open(&db_path).unwrap();
        assert_eq!(verify_count(&conn).unwrap(), 3);
        assert_eq!(get_output_rows(&conn).unwrap(), rows);
    }

    #[test]
    fn test_snapshot_replaces_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("out.db");

        let mut conn = Connection::open(&db_path).unwrap();
        setup_database(&conn).unwrap();

        replace_output_rows(&mut conn, &[create_row(1, 1), create_row(2, 2)], "a").unwrap();
        replace_output_rows(&mut conn, &[create_row(1, 3)], "b").unwrap();

        assert_eq!(verify_count(&conn).unwrap(), 1);
        let run_id: String = conn
            .query_row("SELECT run_id FROM deal_output", [], |row| row.get(0))
            .unwrap();
        assert_eq!(run_id, "b");
    }

    #[test]
    fn test_missing_csv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_snapshot(
            &dir.path().join("missing.csv"),
            &dir.path().join("out.db"),
            "run",
        );
        assert!(result.is_err());
    }
}
