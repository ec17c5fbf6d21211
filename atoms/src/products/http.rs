use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use super::model::{CreateProductPayload, UpdateProductPayload};
use super::service::{
    create_product, delete_product, get_product, load_products_for_user, update_product,
};

/// HTTP Handler: GET /products
pub async fn list_products_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match load_products_for_user(client, table_name, user_id).await {
        Ok(products) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&products)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("list_products_handler failed: user={}, error={}", user_id, e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// HTTP Handler: POST /products
pub async fn create_product_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: CreateProductPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .body(
                    serde_json::json!({"error": format!("Invalid product payload: {}", e)})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
    };

    match create_product(client, table_name, user_id, payload).await {
        Ok(product) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&product)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("create_product_handler failed: user={}, error={}", user_id, e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// HTTP Handler: GET /products/{id}
pub async fn get_product_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match get_product(client, table_name, user_id, product_id).await {
        Ok(product) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&product)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Product not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}

/// HTTP Handler: PATCH /products/{id}
pub async fn update_product_handler(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: UpdateProductPayload = serde_json::from_slice(body)?;

    match update_product(client, table_name, user_id, product_id, payload).await {
        Ok(product) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(&product)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Product not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(
                "update_product_handler failed: user={}, product={}, error={}",
                user_id,
                product_id,
                e
            );
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// HTTP Handler: DELETE /products/{id}
pub async fn delete_product_handler(
    client: &DynamoClient,
    s3_client: &S3Client,
    bucket_name: &str,
    table_name: &str,
    user_id: &str,
    product_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match delete_product(client, s3_client, bucket_name, table_name, user_id, product_id).await {
        Ok(_) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) if e == "Product not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}
