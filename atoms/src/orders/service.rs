use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{is_valid_transition, CreateOrderPayload, Order, OrderItem, UpdateOrderPayload};
use crate::products;

fn item_to_order(user_id: &str, order_id: &str, item: &HashMap<String, AttributeValue>) -> Order {
    let items: Vec<OrderItem> = item
        .get("items")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    Order {
        order_id: order_id.to_string(),
        user_id: user_id.to_string(),
        client_name: item
            .get("client_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        client_email: item
            .get("client_email")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        client_phone: item
            .get("client_phone")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        status: item
            .get("status")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "pending".to_string()),
        total: item
            .get("total")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0.0),
        items,
        notes: item
            .get("notes")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        updated_at: item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
    }
}

/// List all orders of one representative, newest first
pub async fn load_orders_for_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<Order>, String> {
    let pk = format!("USER#{}", user_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("ORDER#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut orders = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(order_id) = sk.strip_prefix("ORDER#") {
                orders.push(item_to_order(user_id, order_id, item));
            }
        }
    }

    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(orders)
}

pub async fn get_order(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    order_id: &str,
) -> Result<Order, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("ORDER#{}", order_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        Ok(item_to_order(user_id, order_id, item))
    } else {
        Err("Order not found".to_string())
    }
}

/// Create an order: price each line from the current catalog, persist,
/// then decrement stock on tracked products. Unknown product ids fail
/// the whole order before anything is written.
pub async fn create_order(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateOrderPayload,
) -> Result<Order, String> {
    if payload.items.is_empty() {
        return Err("Order must contain at least one item".to_string());
    }

    let mut items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        if line.quantity <= 0 {
            return Err(format!(
                "Invalid quantity {} for product {}",
                line.quantity, line.product_id
            ));
        }
        let product =
            products::get_product(client, table_name, user_id, &line.product_id).await?;
        items.push(OrderItem {
            product_id: product.product_id,
            product_name: product.name,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    let total: f64 = items
        .iter()
        .map(|i| i.unit_price * i.quantity as f64)
        .sum();

    let order_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let items_json =
        serde_json::to_string(&items).map_err(|e| format!("Failed to encode items: {}", e))?;

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .item("SK", AttributeValue::S(format!("ORDER#{}", order_id)))
        .item("client_name", AttributeValue::S(payload.client_name.clone()))
        .item("status", AttributeValue::S("pending".to_string()))
        .item("total", AttributeValue::N(total.to_string()))
        .item("items", AttributeValue::S(items_json))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(email) = &payload.client_email {
        builder = builder.item("client_email", AttributeValue::S(email.clone()));
    }
    if let Some(phone) = &payload.client_phone {
        builder = builder.item("client_phone", AttributeValue::S(phone.clone()));
    }
    if let Some(notes) = &payload.notes {
        builder = builder.item("notes", AttributeValue::S(notes.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    // Stock updates come after the order row; a failed decrement is logged
    // but does not undo the order.
    for item in &items {
        if let Err(e) =
            products::decrement_stock(client, table_name, user_id, &item.product_id, item.quantity)
                .await
        {
            tracing::error!(
                "Failed to decrement stock: order={}, product={}, error={}",
                order_id,
                item.product_id,
                e
            );
        }
    }

    Ok(Order {
        order_id,
        user_id: user_id.to_string(),
        client_name: payload.client_name,
        client_email: payload.client_email,
        client_phone: payload.client_phone,
        status: "pending".to_string(),
        total,
        items,
        notes: payload.notes,
        created_at: now,
        updated_at: None,
    })
}

/// Update order status / notes. Status changes must follow
/// pending -> confirmed -> shipped (cancellation allowed until shipped).
pub async fn update_order(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    order_id: &str,
    payload: UpdateOrderPayload,
) -> Result<Order, String> {
    let order = get_order(client, table_name, user_id, order_id).await?;

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(status) = &payload.status {
        if !is_valid_transition(&order.status, status) {
            return Err(format!(
                "Invalid status transition: {} -> {}",
                order.status, status
            ));
        }
        update_expr.push("#status = :status");
        expr_names.insert("#status".to_string(), "status".to_string());
        expr_values.insert(":status".to_string(), AttributeValue::S(status.clone()));
    }
    if let Some(notes) = payload.notes {
        update_expr.push("notes = :notes");
        expr_values.insert(":notes".to_string(), AttributeValue::S(notes));
    }

    if !update_expr.is_empty() {
        update_expr.push("updated_at = :updated_at");
        expr_values.insert(
            ":updated_at".to_string(),
            AttributeValue::S(chrono::Utc::now().to_rfc3339()),
        );

        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
            .key("SK", AttributeValue::S(format!("ORDER#{}", order_id)))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_order(client, table_name, user_id, order_id).await
}
