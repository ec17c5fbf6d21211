use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use std::collections::HashMap;

use super::model::{Brand, CreateBrandPayload, UpdateBrandPayload};

fn item_to_brand(user_id: &str, brand_id: &str, item: &HashMap<String, AttributeValue>) -> Brand {
    Brand {
        brand_id: brand_id.to_string(),
        user_id: user_id.to_string(),
        name: item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        logo_url: item
            .get("logo_url")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// GET /brands
pub async fn list_brands(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("USER#{}", user_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("BRAND#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut brands = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(brand_id) = sk.strip_prefix("BRAND#") {
                brands.push(item_to_brand(user_id, brand_id, item));
            }
        }
    }
    brands.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&brands)?.into())
        .map_err(Box::new)?)
}

/// POST /brands
pub async fn create_brand(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateBrandPayload = serde_json::from_slice(body)?;

    let brand_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .item("SK", AttributeValue::S(format!("BRAND#{}", brand_id)))
        .item("name", AttributeValue::S(req.name.clone()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(logo_url) = &req.logo_url {
        builder = builder.item("logo_url", AttributeValue::S(logo_url.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    let created = Brand {
        brand_id,
        user_id: user_id.to_string(),
        name: req.name,
        logo_url: req.logo_url,
        created_at: now,
    };

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&created)?.into())
        .map_err(Box::new)?)
}

/// GET /brands/{id}
pub async fn get_brand(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    brand_id: &str,
) -> Result<Response<Body>, Error> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("BRAND#{}", brand_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        let found = item_to_brand(user_id, brand_id, item);
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&found)?.into())
            .map_err(Box::new)?)
    } else {
        Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": "Brand not found"}).to_string().into())
            .map_err(Box::new)?)
    }
}

/// PATCH /brands/{id}
pub async fn update_brand(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    brand_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateBrandPayload = serde_json::from_slice(body)?;

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = req.name {
        update_expr.push("#name = :name");
        expr_names.insert("#name".to_string(), "name".to_string());
        expr_values.insert(":name".to_string(), AttributeValue::S(name));
    }
    if let Some(logo_url) = req.logo_url {
        update_expr.push("logo_url = :logo_url");
        expr_values.insert(":logo_url".to_string(), AttributeValue::S(logo_url));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
            .key("SK", AttributeValue::S(format!("BRAND#{}", brand_id)))
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

    get_brand(client, table_name, user_id, brand_id).await
}

/// DELETE /brands/{id}
pub async fn delete_brand(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    brand_id: &str,
) -> Result<Response<Body>, Error> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("BRAND#{}", brand_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::Empty)
        .map_err(Box::new)?)
}
