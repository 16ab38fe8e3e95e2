// src/extractors/record.rs
use roxmltree::Document;

use crate::extractors::fields::{FieldValue, FIELD_SPECS};
use crate::irs::models::RawFiling;

/// One output row: the extracted values for a single filing, in field-table
/// order. Assembled once per successfully retrieved filing and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NPORecord {
    values: Vec<FieldValue>,
}

impl NPORecord {
    /// Pure composition of already-extracted values. The value sequence
    /// must come from evaluating the field table in order, so column count
    /// and ordering are fixed by construction.
    pub fn assemble(values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(values.len(), FIELD_SPECS.len());
        Self { values }
    }

    /// Column names, in output order.
    pub fn columns() -> Vec<&'static str> {
        FIELD_SPECS.iter().map(|spec| spec.name).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The row rendered for delimited output.
    pub fn to_row(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}

/// Extracts one record from a retrieved filing. A pure function of the
/// document and the field table: every field resolves to a value or its
/// default, so the only failure mode is a document that does not parse.
pub fn extract_record(filing: &RawFiling) -> Result<NPORecord, roxmltree::Error> {
    let doc = Document::parse(filing.xml())?;
    let values = FIELD_SPECS.iter().map(|spec| spec.evaluate(&doc)).collect();
    Ok(NPORecord::assemble(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "<Return xmlns=\"http://www.irs.gov/efile\">\
        <EIN>541234567</EIN>\
        <BusinessNameLine1Txt>HELPING HANDS</BusinessNameLine1Txt>\
        <TotalRevenueAmt>50000</TotalRevenueAmt>\
        <CYTotalExpensesAmt>30000</CYTotalExpensesAmt>\
        <PoliticalCampaignActyInd>false</PoliticalCampaignActyInd>\
        </Return>";

    fn sample_filing() -> RawFiling {
        RawFiling::from_body(111, SAMPLE.to_string())
    }

    #[test]
    fn record_has_one_value_per_spec() {
        let record = extract_record(&sample_filing()).unwrap();
        assert_eq!(record.len(), FIELD_SPECS.len());
        assert_eq!(record.to_row().len(), NPORecord::columns().len());
    }

    #[test]
    fn extraction_is_idempotent() {
        let filing = sample_filing();
        let first = extract_record(&filing).unwrap();
        let second = extract_record(&filing).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn row_values_land_in_column_positions() {
        let record = extract_record(&sample_filing()).unwrap();
        let columns = NPORecord::columns();
        let row = record.to_row();

        let col = |name: &str| columns.iter().position(|c| *c == name).unwrap();
        assert_eq!(row[col("ein")], "541234567");
        assert_eq!(row[col("org_name")], "HELPING HANDS");
        assert_eq!(row[col("total_revenue")], "50000");
        assert_eq!(row[col("total_expenses")], "30000");
        assert_eq!(row[col("pol_act")], "0");
        // Missing tags surface as their defaults, never as gaps.
        assert_eq!(row[col("volunteer_ct")], "0");
        assert_eq!(row[col("lob_act")], "2");
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let filing = RawFiling::from_body(9, "<Return><EIN>1".to_string());
        assert!(extract_record(&filing).is_err());
    }
}
