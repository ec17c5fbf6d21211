//! PROCV: spreadsheet-driven bulk price/stock updates, named after the
//! Portuguese VLOOKUP. The client parses the workbook and posts
//! header-driven rows plus the column mapping; this crate classifies each
//! row against the caller's catalog and applies only the real changes.

pub mod engine;
pub mod http;
pub mod log;
pub mod parse;
pub mod types;

pub use engine::{apply_sync, classify_rows, index_products, preview_sync};
pub use http::*;
pub use types::{MatchKey, Outcome, RowResult, SyncReport, SyncRequest, TargetField};
