use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use std::collections::HashMap;

use super::model::{Settings, UpdateSettingsPayload};

fn item_to_settings(user_id: &str, item: &HashMap<String, AttributeValue>) -> Settings {
    Settings {
        user_id: user_id.to_string(),
        store_name: item
            .get("store_name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Minha Loja".to_string()),
        slug: item
            .get("slug")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        welcome_message: item
            .get("welcome_message")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        catalog_password: item
            .get("catalog_password")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        notification_email: item
            .get("notification_email")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        updated_at: item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
    }
}

/// Load settings for internal use (order notification dispatch).
/// Missing row is not an error - defaults apply.
pub async fn load_settings(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Settings, String> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S("SETTINGS".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    Ok(result
        .item()
        .map(|item| item_to_settings(user_id, item))
        .unwrap_or_else(|| Settings::defaults(user_id)))
}

/// GET /settings
pub async fn get_settings(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    match load_settings(client, table_name, user_id).await {
        Ok(settings) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&settings)?.into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}

/// PATCH /settings - upsert, only provided fields are written
pub async fn update_settings(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateSettingsPayload = serde_json::from_slice(body)?;

    let mut update_expr = vec![];
    let mut expr_values = HashMap::new();

    if let Some(store_name) = req.store_name {
        update_expr.push("store_name = :store_name");
        expr_values.insert(":store_name".to_string(), AttributeValue::S(store_name));
    }
    if let Some(slug) = req.slug {
        update_expr.push("slug = :slug");
        expr_values.insert(":slug".to_string(), AttributeValue::S(slug));
    }
    if let Some(welcome_message) = req.welcome_message {
        update_expr.push("welcome_message = :welcome_message");
        expr_values.insert(
            ":welcome_message".to_string(),
            AttributeValue::S(welcome_message),
        );
    }
    if let Some(catalog_password) = req.catalog_password {
        update_expr.push("catalog_password = :catalog_password");
        expr_values.insert(
            ":catalog_password".to_string(),
            AttributeValue::S(catalog_password),
        );
    }
    if let Some(notification_email) = req.notification_email {
        update_expr.push("notification_email = :notification_email");
        expr_values.insert(
            ":notification_email".to_string(),
            AttributeValue::S(notification_email),
        );
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
            .key("SK", AttributeValue::S("SETTINGS".to_string()))
            .update_expression(format!("SET {}", update_expr.join(", ")));

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder
            .send()
            .await
            .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    }

    get_settings(client, table_name, user_id).await
}
