// ⚖️ Reconciliation Engine - enrich deals from the reference catalogs
//
// Three left outer joins, applied in sequence:
//   deals ⟕ country  ON Country  = Code
//         ⟕ currency ON Currency = Code
//         ⟕ company  ON Company  = Id
//
// Every deal survives. Unmatched lookups leave empty strings behind; a
// duplicated catalog key repeats the deal once per match.

use crate::catalog::{Catalog, Catalogs, ReferenceEntry};
use crate::deal::{DealRecord, EnrichedRecord};
use serde::{Deserialize, Serialize};

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Enriched rows, in source order
    pub records: Vec<EnrichedRecord>,
    pub input_count: usize,
    pub unmatched_country: usize,
    pub unmatched_currency: usize,
    pub unmatched_company: usize,
}

impl ReconciliationReport {
    /// Extra rows produced by duplicated catalog keys
    pub fn amplified_rows(&self) -> usize {
        self.records.len().saturating_sub(self.input_count)
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciled {} deals into {} rows: {} without country, {} without currency, {} without company",
            self.input_count,
            self.records.len(),
            self.unmatched_country,
            self.unmatched_currency,
            self.unmatched_company
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine
    }

    /// Enrich deals and return just the rows
    pub fn enrich(&self, deals: &[DealRecord], catalogs: &Catalogs) -> Vec<EnrichedRecord> {
        self.reconcile(deals, catalogs).records
    }

    /// Enrich deals and report match statistics
    pub fn reconcile(&self, deals: &[DealRecord], catalogs: &Catalogs) -> ReconciliationReport {
        let rows: Vec<EnrichedRecord> = deals
            .iter()
            .cloned()
            .map(EnrichedRecord::unmatched)
            .collect();

        let rows = left_join(
            rows,
            &catalogs.country,
            |row| &row.deal.country_code,
            |row, entry| {
                row.country_match_code = entry.code.clone();
                row.country_name = entry.display_name.clone();
            },
        );

        let rows = left_join(
            rows,
            &catalogs.currency,
            |row| &row.deal.currency_code,
            |row, entry| {
                row.currency_match_code = entry.code.clone();
                row.currency_name = entry.display_name.clone();
            },
        );

        let rows = left_join(
            rows,
            &catalogs.company,
            |row| &row.deal.company_code,
            |row, entry| {
                row.company_match_id = entry.code.clone();
                row.company_display_name = entry.display_name.clone();
            },
        );

        ReconciliationReport {
            input_count: deals.len(),
            unmatched_country: count_unmatched(&rows, |r| &r.country_match_code),
            unmatched_currency: count_unmatched(&rows, |r| &r.currency_match_code),
            unmatched_company: count_unmatched(&rows, |r| &r.company_match_id),
            records: rows,
        }
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One left outer join step. Original deal columns are never touched; only
/// the columns written by `apply` change.
fn left_join<K, A>(
    rows: Vec<EnrichedRecord>,
    catalog: &Catalog,
    key: K,
    apply: A,
) -> Vec<EnrichedRecord>
where
    K: Fn(&EnrichedRecord) -> &String,
    A: Fn(&mut EnrichedRecord, &ReferenceEntry),
{
    let mut joined = Vec::with_capacity(rows.len());

    for row in rows {
        let matches = catalog.lookup(key(&row));
        match matches.as_slice() {
            [] => joined.push(row),
            [entry] => {
                let mut row = row;
                apply(&mut row, entry);
                joined.push(row);
            }
            many => {
                for entry in many {
                    let mut copy = row.clone();
                    apply(&mut copy, entry);
                    joined.push(copy);
                }
            }
        }
    }

    joined
}

fn count_unmatched<F>(rows: &[EnrichedRecord], field: F) -> usize
where
    F: Fn(&EnrichedRecord) -> &String,
{
    rows.iter().filter(|r| field(r).is_empty()).count()
}

// ============================================================================
// TESTS
// ============================================================================
