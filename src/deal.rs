// 📄 Deal Records - input rows, enriched rows, output rows
// A deal moves through three shapes: raw (as loaded), enriched (after the
// catalog joins) and output (what gets written, one per enriched row).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Names of the five decimal slots, in column order
pub const DECIMAL_COLUMNS: [&str; 5] = ["D1", "D2", "D3", "D4", "D5"];

/// Fixed header of the output file
pub const OUTPUT_HEADER: [&str; 15] = [
    "ROW_NO",
    "Deal Name",
    "D1",
    "D2",
    "D3",
    "D4",
    "D5",
    "Is Active",
    "Country",
    "Currency",
    "COMPANY",
    "COMPANY Name",
    "AsOfDate",
    "ProcessIdentifier",
    "RowHash",
];

// ============================================================================
// DEAL RECORD
// ============================================================================

/// One row of the input batch, exactly as the loader produced it.
///
/// Every field is kept as raw text. Interpretation (decimal parsing, flag
/// normalisation, integer company ids) happens during validation so that the
/// output can always echo the original values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealRecord {
    /// 0-based position in the source batch (header excluded)
    pub row_index: usize,

    pub deal_name: String,

    /// Raw D1..D5 cells
    pub decimal_fields: [String; 5],

    /// Expected "YES"/"NO", any case
    pub is_active: String,

    pub country_code: String,
    pub currency_code: String,

    /// Numeric-looking company identifier
    pub company_code: String,

    /// Content fingerprint, attached before enrichment
    #[serde(default)]
    pub content_hash: Option<u64>,
}

impl DealRecord {
    /// Create a record with an empty field set at the given position
    pub fn new(row_index: usize) -> Self {
        DealRecord {
            row_index,
            deal_name: String::new(),
            decimal_fields: Default::default(),
            is_active: String::new(),
            country_code: String::new(),
            currency_code: String::new(),
            company_code: String::new(),
            content_hash: None,
        }
    }

    /// 1-based row number used in diagnostics and output
    pub fn row_number(&self) -> usize {
        self.row_index + 1
    }

    /// Source fields in column order. The content hash is never part of it.
    pub fn source_fields(&self) -> [&str; 10] {
        [
            self.deal_name.as_str(),
            self.decimal_fields[0].as_str(),
            self.decimal_fields[1].as_str(),
            self.decimal_fields[2].as_str(),
            self.decimal_fields[3].as_str(),
            self.decimal_fields[4].as_str(),
            self.is_active.as_str(),
            self.country_code.as_str(),
            self.currency_code.as_str(),
            self.company_code.as_str(),
        ]
    }

    // Builder helpers, mostly for loaders and tests

    pub fn with_deal_name(mut self, deal_name: &str) -> Self {
        self.deal_name = deal_name.to_string();
        self
    }

    pub fn with_decimals(mut self, values: [&str; 5]) -> Self {
        self.decimal_fields = values.map(|v| v.to_string());
        self
    }

    pub fn with_is_active(mut self, is_active: &str) -> Self {
        self.is_active = is_active.to_string();
        self
    }

    pub fn with_codes(mut self, country: &str, currency: &str, company: &str) -> Self {
        self.country_code = country.to_string();
        self.currency_code = currency.to_string();
        self.company_code = company.to_string();
        self
    }
}

// ============================================================================
// ENRICHED RECORD
// ============================================================================

/// A deal plus the columns appended by the three catalog joins.
///
/// Unmatched lookups leave the corresponding fields as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub deal: DealRecord,

    pub country_match_code: String,
    pub country_name: String,

    pub currency_match_code: String,
    pub currency_name: String,

    pub company_match_id: String,
    pub company_display_name: String,
}

impl EnrichedRecord {
    /// Wrap a deal with all enrichment columns empty
    pub fn unmatched(deal: DealRecord) -> Self {
        EnrichedRecord {
            deal,
            country_match_code: String::new(),
            country_name: String::new(),
            currency_match_code: String::new(),
            currency_name: String::new(),
            company_match_id: String::new(),
            company_display_name: String::new(),
        }
    }

    /// The company id resolved by the join, cross-checked against the deal's
    /// own company code
    pub fn company_child_id(&self) -> &str {
        &self.company_match_id
    }
}

// ============================================================================
// OUTPUT ROW
// ============================================================================

/// The normalized record written for every enriched row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "ROW_NO")]
    pub row_no: usize,

    #[serde(rename = "Deal Name")]
    pub deal_name: String,

    #[serde(rename = "D1")]
    pub d1: String,

    #[serde(rename = "D2")]
    pub d2: String,

    #[serde(rename = "D3")]
    pub d3: String,

    #[serde(rename = "D4")]
    pub d4: String,

    #[serde(rename = "D5")]
    pub d5: String,

    #[serde(rename = "Is Active")]
    pub is_active: String,

    #[serde(rename = "Country")]
    pub country: String,

    #[serde(rename = "Currency")]
    pub currency: String,

    #[serde(rename = "COMPANY")]
    pub company: String,

    #[serde(rename = "COMPANY Name")]
    pub company_name: String,

    #[serde(rename = "AsOfDate")]
    pub as_of_date: NaiveDate,

    #[serde(rename = "ProcessIdentifier")]
    pub process_identifier: u32,

    #[serde(rename = "RowHash")]
    pub row_hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_number_is_one_based() {
        let deal = DealRecord::new(0);
        assert_eq!(deal.row_number(), 1);

        let deal = DealRecord::new(41);
        assert_eq!(deal.row_number(), 42);
    }

    #[test]
    fn test_source_fields_order() {
        let deal = DealRecord::new(3)
            .with_deal_name("Alpha")
            .with_decimals(["1", "2", "3", "4", "5"])
            .with_is_active("Yes")
            .with_codes("US", "USD", "7");

        assert_eq!(
            deal.source_fields(),
            ["Alpha", "1", "2", "3", "4", "5", "Yes", "US", "USD", "7"]
        );
    }

    #[test]
    fn test_unmatched_enrichment_is_empty() {
        let enriched = EnrichedRecord::unmatched(DealRecord::new(0).with_codes("US", "USD", "1"));

        assert_eq!(enriched.country_match_code, "");
        assert_eq!(enriched.currency_match_code, "");
        assert_eq!(enriched.company_child_id(), "");
        assert_eq!(enriched.company_display_name, "");
        assert_eq!(enriched.deal.country_code, "US");
    }

    #[test]
    fn test_output_header_matches_column_count() {
        assert_eq!(OUTPUT_HEADER.len(), 15);
        assert_eq!(OUTPUT_HEADER[0], "ROW_NO");
        assert_eq!(OUTPUT_HEADER[14], "RowHash");
    }
}
