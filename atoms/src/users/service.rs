use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use std::collections::HashMap;

use super::model::{CreateUserPayload, UpdateSubscriptionPayload, UpdateUserPayload, User};

fn item_to_user(user_id: &str, item: &HashMap<String, AttributeValue>) -> User {
    let mut user_name = item
        .get("user_name")
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .unwrap_or_default();
    let user_email = item
        .get("user_email")
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .unwrap_or_default();
    if user_name.trim().is_empty() {
        user_name = user_email.split('@').next().unwrap_or("User").to_string();
    }

    User {
        user_id: user_id.to_string(),
        user_name,
        user_email,
        user_company: item
            .get("user_company")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        user_role: item
            .get("user_role")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "rep".to_string()),
        subscription_status: item
            .get("subscription_status")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "trial".to_string()),
        subscription_expires_at: item
            .get("subscription_expires_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        user_created_at: item
            .get("user_created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        user_last_login: item
            .get("user_last_login")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
    }
}

/// Create the profile row for a new representative. New accounts start on
/// a trial subscription; role defaults to "rep".
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateUserPayload = serde_json::from_slice(body)?;

    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("USER#{}", user_id);
    let role = req.user_role.clone().unwrap_or_else(|| "rep".to_string());

    let mut put_request = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.clone()))
        .item("SK", AttributeValue::S(pk.clone()))
        .item("user_name", AttributeValue::S(req.user_name.clone()))
        .item("user_email", AttributeValue::S(req.user_email.clone()))
        .item("user_role", AttributeValue::S(role.clone()))
        .item("subscription_status", AttributeValue::S("trial".to_string()))
        .item("user_created_at", AttributeValue::S(now.clone()));

    if let Some(company) = &req.user_company {
        put_request = put_request.item("user_company", AttributeValue::S(company.clone()));
    }

    put_request
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    let user = User {
        user_id: user_id.to_string(),
        user_name: req.user_name,
        user_email: req.user_email,
        user_company: req.user_company,
        user_role: role,
        subscription_status: "trial".to_string(),
        subscription_expires_at: None,
        user_created_at: now,
        user_last_login: None,
    };

    let resp = Response::builder()
        .status(StatusCode::CREATED)
        .header("content-type", "application/json")
        .body(serde_json::to_string(&user)?.into())
        .map_err(Box::new)?;
    Ok(resp)
}

/// Get current user, touching last_login on every read
pub async fn get_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let pk = format!("USER#{}", user_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        let mut user = item_to_user(user_id, item);

        let now = chrono::Utc::now().to_rfc3339();
        let _ = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk.clone()))
            .update_expression("SET user_last_login = :login")
            .expression_attribute_values(":login", AttributeValue::S(now.clone()))
            .send()
            .await;
        user.user_last_login = Some(now);

        let resp = Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/json")
            .body(serde_json::to_string(&user)?.into())
            .map_err(Box::new)?;
        Ok(resp)
    } else {
        let resp = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("content-type", "application/json")
            .body(serde_json::json!({"error": "User not found"}).to_string().into())
            .map_err(Box::new)?;
        Ok(resp)
    }
}

/// PATCH /users/me
pub async fn update_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateUserPayload = serde_json::from_slice(body)?;
    let pk = format!("USER#{}", user_id);

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = req.user_name {
        update_expr.push("#user_name = :user_name");
        expr_names.insert("#user_name".to_string(), "user_name".to_string());
        expr_values.insert(":user_name".to_string(), AttributeValue::S(name));
    }
    if let Some(company) = req.user_company {
        update_expr.push("user_company = :user_company");
        expr_values.insert(":user_company".to_string(), AttributeValue::S(company));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
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

    get_user(client, table_name, user_id).await
}

/// Admin: list every registered user (scan on USER# partitions)
pub async fn list_users(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, Error> {
    let result = client
        .scan()
        .table_name(table_name)
        .filter_expression("begins_with(PK, :prefix) AND PK = SK")
        .expression_attribute_values(":prefix", AttributeValue::S("USER#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB scan error: {}", e))?;

    let mut users = Vec::new();
    for item in result.items() {
        if let Some(pk) = item.get("PK").and_then(|v| v.as_s().ok()) {
            if let Some(user_id) = pk.strip_prefix("USER#") {
                users.push(item_to_user(user_id, item));
            }
        }
    }
    users.sort_by(|a, b| a.user_created_at.cmp(&b.user_created_at));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(serde_json::to_string(&users)?.into())
        .map_err(Box::new)?)
}

/// Admin: PATCH /users/{id}/subscription - licensing control
pub async fn update_subscription(
    client: &DynamoClient,
    table_name: &str,
    target_user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateSubscriptionPayload = serde_json::from_slice(body)?;

    if !matches!(req.subscription_status.as_str(), "trial" | "active" | "expired") {
        return Ok(Response::builder()
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .header("content-type", "application/json")
            .body(
                serde_json::json!({"error": format!("Unknown subscription status: {}", req.subscription_status)})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    }

    let pk = format!("USER#{}", target_user_id);

    let mut builder = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .update_expression(if req.subscription_expires_at.is_some() {
            "SET subscription_status = :status, subscription_expires_at = :expires"
        } else {
            "SET subscription_status = :status"
        })
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_values(":status", AttributeValue::S(req.subscription_status));

    if let Some(expires) = req.subscription_expires_at {
        builder = builder.expression_attribute_values(":expires", AttributeValue::S(expires));
    }

    match builder.send().await {
        Ok(_) => get_user(client, table_name, target_user_id).await,
        Err(e) => {
            tracing::error!(
                "update_subscription failed: user={}, error={}",
                target_user_id,
                e
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("content-type", "application/json")
                .body(serde_json::json!({"error": e.to_string()}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}
