use std::collections::HashMap;

use aws_sdk_dynamodb::Client as DynamoClient;

use repvendas_atoms::products::{self, Product, SyncField};

use crate::log::record_sync_run;
use crate::parse::{cell_text, parse_decimal, parse_quantity};
use crate::types::{MatchKey, Outcome, RowResult, SyncReport, SyncRequest, TargetField};

/// Price cells go through float parsing; treat sub-half-cent differences
/// as equal.
const PRICE_EPSILON: f64 = 0.005;

#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub value: f64,
}

fn key_of(product: &Product, key: MatchKey) -> Option<&str> {
    match key {
        MatchKey::ReferenceCode => product.reference_code.as_deref(),
        MatchKey::Barcode => product.barcode.as_deref(),
    }
}

fn value_of(product: &Product, target: TargetField) -> f64 {
    match target {
        TargetField::Price => product.price,
        TargetField::StockQuantity => product.stock_quantity as f64,
    }
}

/// Build the lookup snapshot: chosen key -> (product, current value).
/// Products without the chosen key simply cannot be matched.
pub fn index_products(
    catalog: &[Product],
    key: MatchKey,
    target: TargetField,
) -> HashMap<String, ProductSnapshot> {
    let mut index = HashMap::new();
    for product in catalog {
        if let Some(k) = key_of(product, key) {
            let k = k.trim();
            if !k.is_empty() {
                index.insert(
                    k.to_string(),
                    ProductSnapshot {
                        product_id: product.product_id.clone(),
                        value: value_of(product, target),
                    },
                );
            }
        }
    }
    index
}

fn values_equal(target: TargetField, a: f64, b: f64) -> bool {
    match target {
        TargetField::Price => (a - b).abs() < PRICE_EPSILON,
        TargetField::StockQuantity => a as i64 == b as i64,
    }
}

/// Classify every row against the snapshot. The snapshot is a working
/// copy that is advanced as matches are recorded: when the same key
/// appears twice in an upload, the second row is judged against the value
/// the first row will write, not against the stale pre-run value. That
/// makes a duplicate unchanged row a no_change instead of a double apply.
pub fn classify_rows(
    rows: &[serde_json::Map<String, serde_json::Value>],
    match_column: &str,
    value_column: &str,
    target: TargetField,
    index: &HashMap<String, ProductSnapshot>,
) -> Vec<RowResult> {
    let mut working: HashMap<String, ProductSnapshot> = index.clone();
    let mut results = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let key = cell_text(row, match_column);
        let raw_value = cell_text(row, value_column);
        let new_value = match target {
            TargetField::Price => parse_decimal(&raw_value),
            TargetField::StockQuantity => parse_quantity(&raw_value) as f64,
        };

        match working.get_mut(&key) {
            None => results.push(RowResult {
                row: i,
                key,
                outcome: Outcome::NotFound,
                product_id: None,
                current_value: None,
                new_value: Some(new_value),
            }),
            Some(snapshot) => {
                if values_equal(target, snapshot.value, new_value) {
                    results.push(RowResult {
                        row: i,
                        key,
                        outcome: Outcome::NoChange,
                        product_id: Some(snapshot.product_id.clone()),
                        current_value: Some(snapshot.value),
                        new_value: Some(new_value),
                    });
                } else {
                    results.push(RowResult {
                        row: i,
                        key,
                        outcome: Outcome::Match,
                        product_id: Some(snapshot.product_id.clone()),
                        current_value: Some(snapshot.value),
                        new_value: Some(new_value),
                    });
                    snapshot.value = new_value;
                }
            }
        }
    }

    results
}

fn report_from(results: &[RowResult]) -> SyncReport {
    let mut report = SyncReport {
        total_processed: results.len(),
        ..Default::default()
    };
    for r in results {
        match r.outcome {
            Outcome::Match => {}
            Outcome::NoChange => report.no_change_count += 1,
            Outcome::NotFound => {
                report.mismatch_count += 1;
                report.mismatch_list.push(r.key.clone());
            }
        }
    }
    report
}

/// Classification only - nothing is written. Feeds the review screen
/// before the user commits a run.
pub async fn preview_sync(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    request: &SyncRequest,
) -> Result<(SyncReport, Vec<RowResult>), String> {
    let catalog = products::load_products_for_user(client, table_name, user_id).await?;
    let index = index_products(&catalog, request.match_key, request.target_field);
    let results = classify_rows(
        &request.rows,
        &request.match_column,
        &request.value_column,
        request.target_field,
        &index,
    );
    Ok((report_from(&results), results))
}

/// Apply the match rows through an injected write step, one at a time so
/// a failing row can be isolated. With stop_on_error the first failure
/// aborts the remainder; otherwise failures are counted and the loop
/// continues. NoChange/NotFound rows are never handed to the writer.
pub(crate) async fn apply_matches<F, Fut>(
    results: &[RowResult],
    stop_on_error: bool,
    report: &mut SyncReport,
    mut write: F,
) -> Result<(), String>
where
    F: FnMut(String, f64) -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    for result in results {
        if result.outcome != Outcome::Match {
            continue;
        }
        // Classification guarantees product_id/new_value for matches
        let product_id = result.product_id.clone().unwrap_or_default();
        let new_value = result.new_value.unwrap_or(0.0);

        match write(product_id.clone(), new_value).await {
            Ok(_) => report.updated_count += 1,
            Err(e) => {
                tracing::error!(
                    "Sync row failed: row={}, key={}, product={}, value={}, error={}",
                    result.row,
                    result.key,
                    product_id,
                    new_value,
                    e
                );
                if stop_on_error {
                    return Err(format!(
                        "Sync aborted at row {} (key {}): {}",
                        result.row, result.key, e
                    ));
                }
                report.error_count += 1;
            }
        }
    }

    Ok(())
}

/// Run the sync: classify, then apply the match rows, then write one
/// immutable audit row.
pub async fn apply_sync(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    request: &SyncRequest,
) -> Result<SyncReport, String> {
    let catalog = products::load_products_for_user(client, table_name, user_id).await?;
    let index = index_products(&catalog, request.match_key, request.target_field);
    let results = classify_rows(
        &request.rows,
        &request.match_column,
        &request.value_column,
        request.target_field,
        &index,
    );

    let sync_field = match request.target_field {
        TargetField::Price => SyncField::Price,
        TargetField::StockQuantity => SyncField::StockQuantity,
    };

    let mut report = report_from(&results);

    apply_matches(&results, request.stop_on_error, &mut report, |product_id, value| {
        let field = sync_field;
        async move {
            products::apply_sync_value(client, table_name, user_id, &product_id, field, value)
                .await
        }
    })
    .await?;

    record_sync_run(client, table_name, user_id, &request.filename, request.target_field, &report)
        .await?;

    tracing::info!(
        "Sync run complete: user={}, file={}, processed={}, updated={}, mismatched={}, errors={}",
        user_id,
        request.filename,
        report.total_processed,
        report.updated_count,
        report.mismatch_count,
        report.error_count
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: &str, reference: &str, price: f64, stock: i64) -> Product {
        Product {
            product_id: id.to_string(),
            user_id: "u-1".to_string(),
            name: format!("Product {}", id),
            brand: None,
            price,
            stock_quantity: stock,
            track_stock: true,
            reference_code: Some(reference.to_string()),
            barcode: None,
            sku: None,
            image_url: None,
            image_path: None,
            images: vec![],
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    fn rows(raw: serde_json::Value) -> Vec<serde_json::Map<String, serde_json::Value>> {
        raw.as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn unknown_keys_are_reported_never_created() {
        let catalog = vec![product("p1", "A1", 90.0, 0)];
        let index = index_products(&catalog, MatchKey::ReferenceCode, TargetField::Price);
        let results = classify_rows(
            &rows(json!([{"REF": "ZZZ", "VALOR": "50"}])),
            "REF",
            "VALOR",
            TargetField::Price,
            &index,
        );
        assert_eq!(results[0].outcome, Outcome::NotFound);
        assert!(results[0].product_id.is_none());
    }

    #[test]
    fn equal_values_are_no_change() {
        let catalog = vec![product("p1", "A1", 90.0, 0)];
        let index = index_products(&catalog, MatchKey::ReferenceCode, TargetField::Price);
        let results = classify_rows(
            &rows(json!([{"REF": "A1", "VALOR": "90,00"}])),
            "REF",
            "VALOR",
            TargetField::Price,
            &index,
        );
        assert_eq!(results[0].outcome, Outcome::NoChange);
    }

    #[test]
    fn duplicate_keys_see_the_value_the_earlier_row_writes() {
        // Two identical rows for A1 (90 -> 100) plus an unknown key:
        // the first is a match, the second a no_change (it is judged
        // against 100, not the stale 90), ZZZ is not_found.
        let catalog = vec![product("p1", "A1", 90.0, 0)];
        let index = index_products(&catalog, MatchKey::ReferenceCode, TargetField::Price);
        let results = classify_rows(
            &rows(json!([
                {"REF": "A1", "VALOR": 100},
                {"REF": "A1", "VALOR": 100},
                {"REF": "ZZZ", "VALOR": 50},
            ])),
            "REF",
            "VALOR",
            TargetField::Price,
            &index,
        );
        assert_eq!(results[0].outcome, Outcome::Match);
        assert_eq!(results[0].current_value, Some(90.0));
        assert_eq!(results[0].new_value, Some(100.0));
        assert_eq!(results[1].outcome, Outcome::NoChange);
        assert_eq!(results[1].current_value, Some(100.0));
        assert_eq!(results[2].outcome, Outcome::NotFound);
    }

    #[test]
    fn stock_rows_compare_as_integers() {
        let catalog = vec![product("p1", "A1", 90.0, 15)];
        let index = index_products(&catalog, MatchKey::ReferenceCode, TargetField::StockQuantity);
        let results = classify_rows(
            &rows(json!([
                {"REF": "A1", "ESTOQUE": "15"},
                {"REF": "A1", "ESTOQUE": "20"},
            ])),
            "REF",
            "ESTOQUE",
            TargetField::StockQuantity,
            &index,
        );
        assert_eq!(results[0].outcome, Outcome::NoChange);
        assert_eq!(results[1].outcome, Outcome::Match);
    }

    #[test]
    fn malformed_cells_parse_to_zero_and_still_classify() {
        let catalog = vec![product("p1", "A1", 90.0, 0)];
        let index = index_products(&catalog, MatchKey::ReferenceCode, TargetField::Price);
        let results = classify_rows(
            &rows(json!([{"REF": "A1", "VALOR": "abc"}])),
            "REF",
            "VALOR",
            TargetField::Price,
            &index,
        );
        // 90 -> 0 is a real change
        assert_eq!(results[0].outcome, Outcome::Match);
        assert_eq!(results[0].new_value, Some(0.0));
    }

    #[test]
    fn report_counts_follow_the_classification() {
        let catalog = vec![product("p1", "A1", 90.0, 0)];
        let index = index_products(&catalog, MatchKey::ReferenceCode, TargetField::Price);
        let results = classify_rows(
            &rows(json!([
                {"REF": "A1", "VALOR": 100},
                {"REF": "A1", "VALOR": 100},
                {"REF": "ZZZ", "VALOR": 50},
            ])),
            "REF",
            "VALOR",
            TargetField::Price,
            &index,
        );
        let report = report_from(&results);
        assert_eq!(report.total_processed, 3);
        assert_eq!(report.no_change_count, 1);
        assert_eq!(report.mismatch_count, 1);
        assert_eq!(report.mismatch_list, vec!["ZZZ".to_string()]);
        // updated_count is only incremented by the apply loop
        assert_eq!(report.updated_count, 0);
    }

    fn match_row(row: usize, key: &str, product_id: &str, new_value: f64) -> RowResult {
        RowResult {
            row,
            key: key.to_string(),
            outcome: Outcome::Match,
            product_id: Some(product_id.to_string()),
            current_value: Some(0.0),
            new_value: Some(new_value),
        }
    }

    #[tokio::test]
    async fn stop_on_error_halts_at_the_first_failing_row() {
        let results = vec![
            match_row(0, "A1", "p-a", 10.0),
            match_row(1, "B2", "p-b", 20.0),
            match_row(2, "C3", "p-c", 30.0),
        ];
        let attempted = std::cell::RefCell::new(Vec::new());
        let mut report = SyncReport::default();

        let outcome = apply_matches(&results, true, &mut report, |product_id, _| {
            attempted.borrow_mut().push(product_id.clone());
            async move {
                if product_id == "p-b" {
                    Err("write refused".to_string())
                } else {
                    Ok(())
                }
            }
        })
        .await;

        let err = outcome.unwrap_err();
        assert!(err.contains("row 1"));
        assert!(err.contains("B2"));
        // The third row is never attempted
        assert_eq!(*attempted.borrow(), vec!["p-a".to_string(), "p-b".to_string()]);
        assert_eq!(report.updated_count, 1);
        assert_eq!(report.error_count, 0);
    }

    #[tokio::test]
    async fn without_stop_on_error_failures_accumulate_and_the_run_continues() {
        let results = vec![
            match_row(0, "A1", "p-a", 10.0),
            match_row(1, "B2", "p-b", 20.0),
            match_row(2, "C3", "p-c", 30.0),
        ];
        let attempted = std::cell::RefCell::new(Vec::new());
        let mut report = SyncReport::default();

        let outcome = apply_matches(&results, false, &mut report, |product_id, _| {
            attempted.borrow_mut().push(product_id.clone());
            async move {
                if product_id == "p-b" {
                    Err("write refused".to_string())
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(attempted.borrow().len(), 3);
        assert_eq!(report.updated_count, 2);
        assert_eq!(report.error_count, 1);
    }

    #[tokio::test]
    async fn only_match_rows_reach_the_writer() {
        let mut no_change = match_row(0, "A1", "p-a", 10.0);
        no_change.outcome = Outcome::NoChange;
        let mut not_found = match_row(1, "ZZZ", "", 5.0);
        not_found.outcome = Outcome::NotFound;
        not_found.product_id = None;
        let results = vec![no_change, not_found, match_row(2, "B2", "p-b", 20.0)];

        let attempted = std::cell::RefCell::new(Vec::new());
        let mut report = SyncReport::default();

        apply_matches(&results, true, &mut report, |product_id, _| {
            attempted.borrow_mut().push(product_id.clone());
            async move { Ok(()) }
        })
        .await
        .unwrap();

        assert_eq!(*attempted.borrow(), vec!["p-b".to_string()]);
        assert_eq!(report.updated_count, 1);
    }

    #[test]
    fn products_without_the_chosen_key_cannot_match() {
        let mut p = product("p1", "A1", 90.0, 0);
        p.reference_code = None;
        p.barcode = Some("789000".to_string());
        let by_reference =
            index_products(&[p.clone()], MatchKey::ReferenceCode, TargetField::Price);
        assert!(by_reference.is_empty());
        let by_barcode = index_products(&[p], MatchKey::Barcode, TargetField::Price);
        assert!(by_barcode.contains_key("789000"));
    }
}
