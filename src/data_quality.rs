// ✅ Data Quality Engine - validate enriched deals
//
// Eight rules, each evaluated independently for every record, always in the
// same order. A failing rule adds a diagnostic; it never drops or alters the
// output row. Every enriched record yields exactly one OutputRow.

use crate::deal::{EnrichedRecord, OutputRow, DECIMAL_COLUMNS};
use crate::environment::RunStamp;
use crate::hashing::row_hash;
use crate::report::{Diagnostic, ErrorReporter};
use serde::{Deserialize, Serialize};

// ============================================================================
// RULES
// ============================================================================

/// Validation rules, declared in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Deal name must be non-empty
    DealNameRequired,
    /// Each of D1..D5 must parse as a decimal
    DecimalFormat,
    /// D1..D5 must not all be zero after defaulting
    AtLeastOneDecimal,
    /// Is Active must be YES or NO
    IsActiveFlag,
    /// Country code must equal the catalog match
    CountryMatch,
    /// Currency code must equal the catalog match
    CurrencyMatch,
    /// Company code must equal the catalog id
    CompanyCrossCheck,
    /// Country, currency and company cannot all be missing
    MandatoryFields,
}

impl Rule {
    pub const ALL: [Rule; 8] = [
        Rule::DealNameRequired,
        Rule::DecimalFormat,
        Rule::AtLeastOneDecimal,
        Rule::IsActiveFlag,
        Rule::CountryMatch,
        Rule::CurrencyMatch,
        Rule::CompanyCrossCheck,
        Rule::MandatoryFields,
    ];

    /// 1-based position in the evaluation order
    pub fn order(&self) -> u8 {
        match self {
            Rule::DealNameRequired => 1,
            Rule::DecimalFormat => 2,
            Rule::AtLeastOneDecimal => 3,
            Rule::IsActiveFlag => 4,
            Rule::CountryMatch => 5,
            Rule::CurrencyMatch => 6,
            Rule::CompanyCrossCheck => 7,
            Rule::MandatoryFields => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::DealNameRequired => "deal_name_required",
            Rule::DecimalFormat => "decimal_format",
            Rule::AtLeastOneDecimal => "at_least_one_decimal",
            Rule::IsActiveFlag => "is_active_flag",
            Rule::CountryMatch => "country_match",
            Rule::CurrencyMatch => "currency_match",
            Rule::CompanyCrossCheck => "company_cross_check",
            Rule::MandatoryFields => "mandatory_fields",
        }
    }

    /// Message text written to the error report
    pub fn message(&self) -> &'static str {
        match self {
            Rule::DealNameRequired => "Missing Deal Name, it is a Mandatory column.",
            Rule::DecimalFormat => "only Decimal/Float is allowed",
            Rule::AtLeastOneDecimal => {
                "D1-D5 are all empty/invalid, need atleast one Decimal value"
            }
            Rule::IsActiveFlag => "only Yes/No is allowed",
            Rule::CountryMatch => "invalid/missing Country code",
            Rule::CurrencyMatch => "invalid/missing Currency code",
            // Same wording as the currency rule; kept so existing report
            // consumers keep matching on it.
            Rule::CompanyCrossCheck => "invalid/missing Currency code",
            // CURRENCY repeated, COUNTRY missing: existing error files carry
            // this exact text.
            Rule::MandatoryFields => "COMPANY, CURRENCY and CURRENCY are mandatory fields",
        }
    }
}

// ============================================================================
// VALIDATION OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub output: OutputRow,
    /// In rule order
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ============================================================================
// PARSING HELPERS
// ============================================================================

/// Parse a decimal slot after trimming. Only finite numbers are accepted.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the company code and the catalog id as integers.
///
/// If either side fails to parse, both fall back to the pair (0, 1), which
/// never compares equal.
pub fn parse_company_pair(company_code: &str, child_id: &str) -> (i64, i64) {
    match (
        company_code.trim().parse::<i64>(),
        child_id.trim().parse::<i64>(),
    ) {
        (Ok(master), Ok(child)) => (master, child),
        _ => (0, 1),
    }
}

/// Company value used by the mandatory-fields rule: the integer company
/// code, or 0 when it is missing or not numeric
pub fn resolved_company(company_code: &str) -> i64 {
    company_code.trim().parse::<i64>().unwrap_or(0)
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine {
    /// As-of date and process id stamped on every output row
    stamp: RunStamp,
}

impl DataQualityEngine {
    pub fn new(stamp: RunStamp) -> Self {
        DataQualityEngine { stamp }
    }

    /// Validate one enriched record.
    ///
    /// Pure: the same record always gives the same output row and the same
    /// diagnostics.
    pub fn validate(&self, record: &EnrichedRecord) -> ValidationOutcome {
        let mut diagnostics = Vec::new();

        // Rule 1
        self.check_deal_name(record, &mut diagnostics);

        // Rules 2 and 3
        let values = self.check_decimals(record, &mut diagnostics);
        self.check_any_decimal(record, &values, &mut diagnostics);

        // Rule 4
        self.check_is_active(record, &mut diagnostics);

        // Rules 5 and 6
        self.check_country(record, &mut diagnostics);
        self.check_currency(record, &mut diagnostics);

        // Rule 7
        self.check_company(record, &mut diagnostics);

        // Rule 8
        self.check_mandatory_fields(record, &mut diagnostics);

        ValidationOutcome {
            output: self.build_output(record),
            diagnostics,
        }
    }

    /// Validate records in order, collecting diagnostics into `reporter`.
    /// Returns one output row per record.
    pub fn validate_batch(
        &self,
        records: &[EnrichedRecord],
        reporter: &mut ErrorReporter,
    ) -> Vec<OutputRow> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let outcome = self.validate(record);
            reporter.extend(outcome.diagnostics);
            rows.push(outcome.output);
        }
        rows
    }

    // ========================================================================
    // VALIDATION RULES
    // ========================================================================

    fn check_deal_name(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) {
        let deal = &record.deal;
        if deal.deal_name.is_empty() {
            out.push(Diagnostic::for_column(
                deal.row_number(),
                Rule::DealNameRequired,
                "Deal Name",
                &deal.deal_name,
            ));
        }
    }

    /// Parse D1..D5. Failures are reported per column and count as 0.
    fn check_decimals(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) -> [f64; 5] {
        let deal = &record.deal;
        let mut values = [0.0; 5];

        for (slot, raw) in deal.decimal_fields.iter().enumerate() {
            match parse_decimal(raw) {
                Some(value) => values[slot] = value,
                None => out.push(Diagnostic::for_column(
                    deal.row_number(),
                    Rule::DecimalFormat,
                    DECIMAL_COLUMNS[slot],
                    raw.trim(),
                )),
            }
        }

        values
    }

    fn check_any_decimal(
        &self,
        record: &EnrichedRecord,
        values: &[f64; 5],
        out: &mut Vec<Diagnostic>,
    ) {
        if values.iter().all(|&v| v == 0.0) {
            out.push(Diagnostic::for_row(
                record.deal.row_number(),
                Rule::AtLeastOneDecimal,
            ));
        }
    }

    fn check_is_active(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) {
        let normalized = record.deal.is_active.trim().to_uppercase();
        if normalized != "YES" && normalized != "NO" {
            out.push(Diagnostic::for_column(
                record.deal.row_number(),
                Rule::IsActiveFlag,
                "IS_ACTIVE",
                &normalized,
            ));
        }
    }

    fn check_country(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) {
        let deal = &record.deal;
        if deal.country_code != record.country_match_code {
            out.push(Diagnostic::for_column(
                deal.row_number(),
                Rule::CountryMatch,
                "Country",
                deal.country_code.trim(),
            ));
        }
    }

    fn check_currency(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) {
        let deal = &record.deal;
        if deal.currency_code != record.currency_match_code {
            out.push(Diagnostic::for_column(
                deal.row_number(),
                Rule::CurrencyMatch,
                "Currency",
                deal.currency_code.trim(),
            ));
        }
    }

    fn check_company(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) {
        let deal = &record.deal;
        let (master_id, child_id) =
            parse_company_pair(&deal.company_code, record.company_child_id());
        if master_id != child_id {
            out.push(Diagnostic::for_column(
                deal.row_number(),
                Rule::CompanyCrossCheck,
                "COMPANY",
                &deal.company_code,
            ));
        }
    }

    fn check_mandatory_fields(&self, record: &EnrichedRecord, out: &mut Vec<Diagnostic>) {
        let deal = &record.deal;
        if deal.country_code.is_empty()
            && deal.currency_code.is_empty()
            && resolved_company(&deal.company_code) <= 0
        {
            out.push(Diagnostic::for_row(deal.row_number(), Rule::MandatoryFields));
        }
    }

    // ========================================================================
    // OUTPUT
    // ========================================================================

    fn build_output(&self, record: &EnrichedRecord) -> OutputRow {
        let deal = &record.deal;
        let [d1, d2, d3, d4, d5] = deal.decimal_fields.clone();

        OutputRow {
            row_no: deal.row_number(),
            deal_name: deal.deal_name.clone(),
            d1,
            d2,
            d3,
            d4,
            d5,
            is_active: deal.is_active.clone(),
            country: deal.country_code.clone(),
            currency: deal.currency_code.clone(),
            company: deal.company_code.clone(),
            company_name: record.company_display_name.clone(),
            as_of_date: self.stamp.as_of_date,
            process_identifier: self.stamp.process_id,
            row_hash: deal.content_hash.unwrap_or_else(|| row_hash(deal)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
