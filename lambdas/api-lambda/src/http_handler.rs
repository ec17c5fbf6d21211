use std::sync::Arc;

use lambda_http::http::header::HeaderValue;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use procv_sync as procv;
use repvendas_atoms as atoms;
use repvendas_shared::{auth, image_proxy, ingest, notify, AppState};

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,X-User-Id"),
    );
    resp
}

fn finalize_response(resp: Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
    resp.map(with_cors_headers)
}

/// Main Lambda handler - routes requests to the catalog, order, sync and
/// image-pipeline endpoints.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let table_name = state.config.table_name.as_str();
    let bucket_name = state.config.bucket_name.as_str();
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    // Image proxy route (public - serves stored catalog images)
    if path.starts_with("/proxy-image/") {
        // URL format: /proxy-image/{user}/{folder}/{file}.jpg
        let image_path = path.strip_prefix("/proxy-image/").unwrap_or("");
        return finalize_response(
            image_proxy::proxy_image(&state.s3_client, bucket_name, image_path).await,
        );
    }

    // Everything below is per-user data: resolve the caller first
    let auth_ctx =
        match auth::authenticate_request(&state.dynamo_client, table_name, event.headers()).await {
            Ok(ctx) => ctx,
            Err(resp) => return Ok(with_cors_headers(resp)),
        };
    let user_id = auth_ctx.user_id.clone();

    // User profile and admin routes
    if path.starts_with("/users") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            // POST /users - create profile row for a fresh signup
            (&Method::POST, ["users"]) => {
                atoms::users::create_user(&state.dynamo_client, table_name, &user_id, body).await
            }
            // GET /users/me - own profile
            (&Method::GET, ["users", "me"]) => {
                atoms::users::get_user(&state.dynamo_client, table_name, &user_id).await
            }
            // PATCH /users/me - update own profile
            (&Method::PATCH, ["users", "me"]) => {
                atoms::users::update_user(&state.dynamo_client, table_name, &user_id, body).await
            }
            // GET /users - admin listing
            (&Method::GET, ["users"]) => match auth::require_admin(&auth_ctx) {
                Ok(_) => atoms::users::list_users(&state.dynamo_client, table_name).await,
                Err(resp) => Ok(resp),
            },
            // PATCH /users/{id}/subscription - admin subscription control
            (&Method::PATCH, ["users", target_user_id, "subscription"]) => {
                match auth::require_admin(&auth_ctx) {
                    Ok(_) => {
                        atoms::users::update_subscription(
                            &state.dynamo_client,
                            table_name,
                            target_user_id,
                            body,
                        )
                        .await
                    }
                    Err(resp) => Ok(resp),
                }
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Product catalog routes
    if path.starts_with("/products") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            // GET /products - list the caller's catalog
            (&Method::GET, ["products"]) => {
                atoms::products::list_products_handler(&state.dynamo_client, table_name, &user_id)
                    .await
            }
            // POST /products - create product
            (&Method::POST, ["products"]) => {
                atoms::products::create_product_handler(
                    &state.dynamo_client,
                    table_name,
                    &user_id,
                    body,
                )
                .await
            }
            // GET /products/{id}
            (&Method::GET, ["products", product_id]) => {
                atoms::products::get_product_handler(
                    &state.dynamo_client,
                    table_name,
                    &user_id,
                    product_id,
                )
                .await
            }
            // PATCH /products/{id}
            (&Method::PATCH, ["products", product_id]) => {
                atoms::products::update_product_handler(
                    &state.dynamo_client,
                    table_name,
                    &user_id,
                    product_id,
                    body,
                )
                .await
            }
            // DELETE /products/{id} - also drops the stored image
            (&Method::DELETE, ["products", product_id]) => {
                atoms::products::delete_product_handler(
                    &state.dynamo_client,
                    &state.s3_client,
                    bucket_name,
                    table_name,
                    &user_id,
                    product_id,
                )
                .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Order routes
    if path.starts_with("/orders") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            // GET /orders - newest first
            (&Method::GET, ["orders"]) => {
                atoms::orders::list_orders_handler(&state.dynamo_client, table_name, &user_id).await
            }
            // POST /orders - create order + notification mail
            (&Method::POST, ["orders"]) => {
                notify::create_order_handler(
                    &state.dynamo_client,
                    &state.ses_client,
                    table_name,
                    &user_id,
                    body,
                )
                .await
            }
            // GET /orders/{id}
            (&Method::GET, ["orders", order_id]) => {
                atoms::orders::get_order_handler(&state.dynamo_client, table_name, &user_id, order_id)
                    .await
            }
            // PATCH /orders/{id} - status/notes
            (&Method::PATCH, ["orders", order_id]) => {
                atoms::orders::update_order_handler(
                    &state.dynamo_client,
                    table_name,
                    &user_id,
                    order_id,
                    body,
                )
                .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Client book routes
    if path.starts_with("/clients") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            (&Method::GET, ["clients"]) => {
                atoms::clients::list_clients(&state.dynamo_client, table_name, &user_id).await
            }
            (&Method::POST, ["clients"]) => {
                atoms::clients::create_client(&state.dynamo_client, table_name, &user_id, body)
                    .await
            }
            (&Method::GET, ["clients", client_id]) => {
                atoms::clients::get_client(&state.dynamo_client, table_name, &user_id, client_id)
                    .await
            }
            (&Method::PATCH, ["clients", client_id]) => {
                atoms::clients::update_client(
                    &state.dynamo_client,
                    table_name,
                    &user_id,
                    client_id,
                    body,
                )
                .await
            }
            (&Method::DELETE, ["clients", client_id]) => {
                atoms::clients::delete_client(&state.dynamo_client, table_name, &user_id, client_id)
                    .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Brand routes
    if path.starts_with("/brands") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            (&Method::GET, ["brands"]) => {
                atoms::brands::list_brands(&state.dynamo_client, table_name, &user_id).await
            }
            (&Method::POST, ["brands"]) => {
                atoms::brands::create_brand(&state.dynamo_client, table_name, &user_id, body).await
            }
            (&Method::GET, ["brands", brand_id]) => {
                atoms::brands::get_brand(&state.dynamo_client, table_name, &user_id, brand_id).await
            }
            (&Method::PATCH, ["brands", brand_id]) => {
                atoms::brands::update_brand(
                    &state.dynamo_client,
                    table_name,
                    &user_id,
                    brand_id,
                    body,
                )
                .await
            }
            (&Method::DELETE, ["brands", brand_id]) => {
                atoms::brands::delete_brand(&state.dynamo_client, table_name, &user_id, brand_id)
                    .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Store settings routes
    if path == "/settings" {
        let resp = match method {
            &Method::GET => {
                atoms::settings::get_settings(&state.dynamo_client, table_name, &user_id).await
            }
            &Method::PATCH => {
                atoms::settings::update_settings(&state.dynamo_client, table_name, &user_id, body)
                    .await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Spreadsheet sync routes
    if path.starts_with("/sync") {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, parts.as_slice()) {
            // POST /sync/preview - classify rows, write nothing
            (&Method::POST, ["sync", "preview"]) => {
                procv::preview_sync_handler(&state.dynamo_client, table_name, &user_id, body).await
            }
            // POST /sync/apply - classify and write matches
            (&Method::POST, ["sync", "apply"]) => {
                procv::apply_sync_handler(&state.dynamo_client, table_name, &user_id, body).await
            }
            // GET /sync/logs - run history, newest first
            (&Method::GET, ["sync", "logs"]) => {
                procv::list_sync_logs_handler(&state.dynamo_client, table_name, &user_id).await
            }
            _ => not_found(),
        };

        return finalize_response(resp);
    }

    // Image ingestion pipeline
    if path == "/images/ingest" {
        return match method {
            &Method::POST => {
                finalize_response(ingest::ingest_external_image(&state, &user_id, body).await)
            }
            _ => finalize_response(not_found()),
        };
    }

    // Order notification resend
    if path == "/notify/order" {
        return match method {
            &Method::POST => finalize_response(
                notify::handle_notify_order(
                    &state.dynamo_client,
                    &state.ses_client,
                    table_name,
                    &user_id,
                    body,
                )
                .await,
            ),
            _ => finalize_response(not_found()),
        };
    }

    // No matching route
    tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
    finalize_response(not_found())
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
