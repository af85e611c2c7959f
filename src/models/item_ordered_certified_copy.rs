use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Event published by the ordering system when a certified copy item is ordered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOrderedCertifiedCopy {
    pub order_number: String,
    pub item_id: String,
    /// Locator of the item within its item group
    pub group_item: String,
    pub company_name: String,
    pub company_number: String,
    pub filing_history_id: String,
    /// Form type code, e.g. `AP01`
    pub filing_history_type: String,
    /// Key into the filing history description table
    pub filing_history_description: String,
    /// Placeholder values substituted into the description text downstream
    pub filing_history_description_values: BTreeMap<String, String>,
}

impl ItemOrderedCertifiedCopy {
    /// Fields identifying the order, for log spans
    pub fn log_context(&self) -> String {
        format!(
            "order_number={} item_id={} company_number={} filing_history_id={}",
            self.order_number, self.item_id, self.company_number, self.filing_history_id
        )
    }
}
