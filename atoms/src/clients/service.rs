use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};
use std::collections::HashMap;

use super::model::{Client, CreateClientPayload, UpdateClientPayload};

fn item_to_client(user_id: &str, client_id: &str, item: &HashMap<String, AttributeValue>) -> Client {
    Client {
        client_id: client_id.to_string(),
        user_id: user_id.to_string(),
        name: item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        email: item
            .get("email")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        phone: item
            .get("phone")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        company: item
            .get("company")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        notes: item
            .get("notes")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    }
}

/// GET /clients
pub async fn list_clients(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(format!("USER#{}", user_id)))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("CLIENT#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut clients = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(client_id) = sk.strip_prefix("CLIENT#") {
                clients.push(item_to_client(user_id, client_id, item));
            }
        }
    }
    clients.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&clients)?.into())
        .map_err(Box::new)?)
}

/// POST /clients
pub async fn create_client(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateClientPayload = serde_json::from_slice(body)?;

    let client_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .item("SK", AttributeValue::S(format!("CLIENT#{}", client_id)))
        .item("name", AttributeValue::S(req.name.clone()))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(email) = &req.email {
        builder = builder.item("email", AttributeValue::S(email.clone()));
    }
    if let Some(phone) = &req.phone {
        builder = builder.item("phone", AttributeValue::S(phone.clone()));
    }
    if let Some(company) = &req.company {
        builder = builder.item("company", AttributeValue::S(company.clone()));
    }
    if let Some(notes) = &req.notes {
        builder = builder.item("notes", AttributeValue::S(notes.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    let created = Client {
        client_id,
        user_id: user_id.to_string(),
        name: req.name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        notes: req.notes,
        created_at: now,
    };

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&created)?.into())
        .map_err(Box::new)?)
}

/// GET /clients/{id}
pub async fn get_client(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    client_id: &str,
) -> Result<Response<Body>, Error> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("CLIENT#{}", client_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        let found = item_to_client(user_id, client_id, item);
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&found)?.into())
            .map_err(Box::new)?)
    } else {
        Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": "Client not found"}).to_string().into())
            .map_err(Box::new)?)
    }
}

/// PATCH /clients/{id}
pub async fn update_client(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    client_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: UpdateClientPayload = serde_json::from_slice(body)?;

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = req.name {
        update_expr.push("#name = :name");
        expr_names.insert("#name".to_string(), "name".to_string());
        expr_values.insert(":name".to_string(), AttributeValue::S(name));
    }
    if let Some(email) = req.email {
        update_expr.push("email = :email");
        expr_values.insert(":email".to_string(), AttributeValue::S(email));
    }
    if let Some(phone) = req.phone {
        update_expr.push("phone = :phone");
        expr_values.insert(":phone".to_string(), AttributeValue::S(phone));
    }
    if let Some(company) = req.company {
        update_expr.push("company = :company");
        expr_values.insert(":company".to_string(), AttributeValue::S(company));
    }
    if let Some(notes) = req.notes {
        update_expr.push("notes = :notes");
        expr_values.insert(":notes".to_string(), AttributeValue::S(notes));
    }

    if !update_expr.is_empty() {
        let mut builder = client
            .update_item()
            .table_name(table_name)
            .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
            .key("SK", AttributeValue::S(format!("CLIENT#{}", client_id)))
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

    get_client(client, table_name, user_id, client_id).await
}

/// DELETE /clients/{id}
pub async fn delete_client(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    client_id: &str,
) -> Result<Response<Body>, Error> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("CLIENT#{}", client_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::Empty)
        .map_err(Box::new)?)
}
