use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request to the document signing service to sign one certified copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignDigitalDocument {
    pub order_number: String,
    pub item_id: String,
    pub group_item: String,
    pub document_type: String,
    /// `s3://<bucket>/<key>` location of the unsigned PDF
    pub private_s3_location: String,
    pub filing_history_description_values: BTreeMap<String, String>,
    pub cover_sheet_data: CoverSheetData,
}

/// Text rendered on the certified copy cover sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverSheetData {
    pub company_name: String,
    pub company_number: String,
    /// Display text resolved from the description table, empty when unknown
    pub description: String,
    /// Filing history type code
    #[serde(rename = "type")]
    pub filing_type: String,
}
