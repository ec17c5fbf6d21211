use serde::{Deserialize, Serialize};

/// Which product column a sync run matches rows on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    #[default]
    ReferenceCode,
    Barcode,
}

/// Which product field a sync run writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetField {
    Price,
    StockQuantity,
}

impl TargetField {
    pub fn label(&self) -> &'static str {
        match self {
            TargetField::Price => "price",
            TargetField::StockQuantity => "stock_quantity",
        }
    }
}

/// One uploaded sync run. Rows are header-driven maps exactly as the
/// spreadsheet parser produced them; match_column / value_column name the
/// columns the user mapped (template suggests REFERENCIA/EAN and
/// VALOR/ESTOQUE, but any header works).
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub filename: String,
    pub match_column: String,
    pub value_column: String,
    pub target_field: TargetField,
    #[serde(default)]
    pub match_key: MatchKey,
    #[serde(default)]
    pub stop_on_error: bool,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Value differs from the catalog - will be written
    Match,
    /// Value equals the catalog - skipped
    NoChange,
    /// No product carries this key - reported, never created
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowResult {
    pub row: usize,
    pub key: String,
    pub outcome: Outcome,
    pub product_id: Option<String>,
    pub current_value: Option<f64>,
    pub new_value: Option<f64>,
}

/// Counts returned by apply and persisted to the audit log
#[derive(Debug, Clone, Serialize, Default)]
pub struct SyncReport {
    pub total_processed: usize,
    pub updated_count: usize,
    pub no_change_count: usize,
    pub mismatch_count: usize,
    pub error_count: usize,
    pub mismatch_list: Vec<String>,
}
