use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use serde::Serialize;
use uuid::Uuid;

use crate::types::{SyncReport, TargetField};

/// One completed sync run. Rows are append-only - a run is history, it is
/// never edited after the fact.
#[derive(Debug, Clone, Serialize)]
pub struct SyncLogEntry {
    pub log_id: String,
    pub user_id: String,
    pub filename: String,
    pub target_column: String,
    pub total_processed: usize,
    pub updated_count: usize,
    pub mismatch_count: usize,
    pub error_count: usize,
    pub mismatch_list: Vec<String>,
    pub created_at: String,
}

pub async fn record_sync_run(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    filename: &str,
    target_field: TargetField,
    report: &SyncReport,
) -> Result<String, String> {
    let log_id = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    let mismatch_list: Vec<AttributeValue> = report
        .mismatch_list
        .iter()
        .map(|k| AttributeValue::S(k.clone()))
        .collect();

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .item(
            "SK",
            AttributeValue::S(format!("SYNCLOG#{}#{}", created_at, log_id)),
        )
        .item("log_id", AttributeValue::S(log_id.clone()))
        .item("user_id", AttributeValue::S(user_id.to_string()))
        .item("filename", AttributeValue::S(filename.to_string()))
        .item(
            "target_column",
            AttributeValue::S(target_field.label().to_string()),
        )
        .item(
            "total_processed",
            AttributeValue::N(report.total_processed.to_string()),
        )
        .item(
            "updated_count",
            AttributeValue::N(report.updated_count.to_string()),
        )
        .item(
            "mismatch_count",
            AttributeValue::N(report.mismatch_count.to_string()),
        )
        .item(
            "error_count",
            AttributeValue::N(report.error_count.to_string()),
        )
        .item("mismatch_list", AttributeValue::L(mismatch_list))
        .item("created_at", AttributeValue::S(created_at))
        .send()
        .await
        .map_err(|e| format!("DynamoDB sync log write error: {}", e))?;

    Ok(log_id)
}

fn item_to_log_entry(
    item: &std::collections::HashMap<String, AttributeValue>,
) -> Option<SyncLogEntry> {
    let count = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0)
    };

    Some(SyncLogEntry {
        log_id: item.get("log_id")?.as_s().ok()?.to_string(),
        user_id: item.get("user_id")?.as_s().ok()?.to_string(),
        filename: item
            .get("filename")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        target_column: item
            .get("target_column")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        total_processed: count("total_processed"),
        updated_count: count("updated_count"),
        mismatch_count: count("mismatch_count"),
        error_count: count("error_count"),
        mismatch_list: item
            .get("mismatch_list")
            .and_then(|v| v.as_l().ok())
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_s().ok().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

/// Sync history for one user, newest run first. The SK embeds the RFC 3339
/// timestamp so Dynamo's own sort order is the chronological order.
pub async fn load_sync_logs(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<SyncLogEntry>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("USER#{}", user_id)))
        .expression_attribute_values(":sk", AttributeValue::S("SYNCLOG#".to_string()))
        .scan_index_forward(false)
        .send()
        .await
        .map_err(|e| format!("DynamoDB sync log query error: {}", e))?;

    let entries = result
        .items()
        .iter()
        .filter_map(item_to_log_entry)
        .collect();

    Ok(entries)
}
