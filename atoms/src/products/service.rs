use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use std::collections::HashMap;

use super::model::{CreateProductPayload, Product, UpdateProductPayload};

/// Which product field a bulk sync run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncField {
    Price,
    StockQuantity,
}

impl SyncField {
    pub fn attribute_name(&self) -> &'static str {
        match self {
            SyncField::Price => "price",
            SyncField::StockQuantity => "stock_quantity",
        }
    }
}

fn item_to_product(
    user_id: &str,
    product_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> Product {
    Product {
        product_id: product_id.to_string(),
        user_id: user_id.to_string(),
        name: item
            .get("name")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        brand: item
            .get("brand")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        price: item
            .get("price")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0.0),
        stock_quantity: item
            .get("stock_quantity")
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        track_stock: item
            .get("track_stock")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(false),
        reference_code: item
            .get("reference_code")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        barcode: item
            .get("barcode")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        sku: item
            .get("sku")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        image_url: item
            .get("image_url")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        image_path: item
            .get("image_path")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string()),
        images: item
            .get("images")
            .and_then(|v| v.as_l().ok())
            .map(|l| {
                l.iter()
                    .filter_map(|v| v.as_s().ok())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default(),
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

fn images_attribute(images: &[String]) -> AttributeValue {
    AttributeValue::L(
        images
            .iter()
            .map(|u| AttributeValue::S(u.clone()))
            .collect(),
    )
}

/// Load the full catalog of one representative (pure domain logic, no HTTP).
/// Used by the PROCV sync to build its lookup snapshot.
pub async fn load_products_for_user(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<Product>, String> {
    let pk = format!("USER#{}", user_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("PRODUCT#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut products = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(product_id) = sk.strip_prefix("PRODUCT#") {
                products.push(item_to_product(user_id, product_id, item));
            }
        }
    }

    // Stable listing order for the catalog screens
    products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    Ok(products)
}

/// Get a single product, scoped to its owner
pub async fn get_product(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
) -> Result<Product, String> {
    let pk = format!("USER#{}", user_id);
    let sk = format!("PRODUCT#{}", product_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    if let Some(item) = result.item() {
        Ok(item_to_product(user_id, product_id, item))
    } else {
        Err("Product not found".to_string())
    }
}

/// Create a new product under the caller's partition
pub async fn create_product(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    payload: CreateProductPayload,
) -> Result<Product, String> {
    let product_id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("USER#{}", user_id);
    let sk = format!("PRODUCT#{}", product_id);

    let images = payload
        .images
        .or_else(|| payload.image_url.clone().map(|u| vec![u]))
        .unwrap_or_default();

    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk))
        .item("SK", AttributeValue::S(sk))
        .item("name", AttributeValue::S(payload.name.clone()))
        .item("price", AttributeValue::N(payload.price.to_string()))
        .item(
            "stock_quantity",
            AttributeValue::N(payload.stock_quantity.unwrap_or(0).to_string()),
        )
        .item(
            "track_stock",
            AttributeValue::Bool(payload.track_stock.unwrap_or(false)),
        )
        .item("images", images_attribute(&images))
        .item("created_at", AttributeValue::S(now.clone()));

    if let Some(brand) = &payload.brand {
        builder = builder.item("brand", AttributeValue::S(brand.clone()));
    }
    if let Some(reference_code) = &payload.reference_code {
        builder = builder.item("reference_code", AttributeValue::S(reference_code.clone()));
    }
    if let Some(barcode) = &payload.barcode {
        builder = builder.item("barcode", AttributeValue::S(barcode.clone()));
    }
    if let Some(sku) = &payload.sku {
        builder = builder.item("sku", AttributeValue::S(sku.clone()));
    }
    if let Some(image_url) = &payload.image_url {
        builder = builder.item("image_url", AttributeValue::S(image_url.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Product {
        product_id,
        user_id: user_id.to_string(),
        name: payload.name,
        brand: payload.brand,
        price: payload.price,
        stock_quantity: payload.stock_quantity.unwrap_or(0),
        track_stock: payload.track_stock.unwrap_or(false),
        reference_code: payload.reference_code,
        barcode: payload.barcode,
        sku: payload.sku,
        image_url: payload.image_url,
        image_path: None,
        images,
        created_at: now,
        updated_at: None,
    })
}

/// Sparse update - only fields present in the payload are written
pub async fn update_product(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
    payload: UpdateProductPayload,
) -> Result<Product, String> {
    // Ensure the row exists before building the expression
    get_product(client, table_name, user_id, product_id).await?;

    let pk = format!("USER#{}", user_id);
    let sk = format!("PRODUCT#{}", product_id);

    let mut update_expr = vec![];
    let mut expr_names = HashMap::new();
    let mut expr_values = HashMap::new();

    if let Some(name) = payload.name {
        update_expr.push("#name = :name");
        expr_names.insert("#name".to_string(), "name".to_string());
        expr_values.insert(":name".to_string(), AttributeValue::S(name));
    }
    if let Some(brand) = payload.brand {
        update_expr.push("brand = :brand");
        expr_values.insert(":brand".to_string(), AttributeValue::S(brand));
    }
    if let Some(price) = payload.price {
        update_expr.push("price = :price");
        expr_values.insert(":price".to_string(), AttributeValue::N(price.to_string()));
    }
    if let Some(stock) = payload.stock_quantity {
        update_expr.push("stock_quantity = :stock");
        expr_values.insert(":stock".to_string(), AttributeValue::N(stock.to_string()));
    }
    if let Some(track) = payload.track_stock {
        update_expr.push("track_stock = :track");
        expr_values.insert(":track".to_string(), AttributeValue::Bool(track));
    }
    if let Some(reference_code) = payload.reference_code {
        update_expr.push("reference_code = :reference_code");
        expr_values.insert(
            ":reference_code".to_string(),
            AttributeValue::S(reference_code),
        );
    }
    if let Some(barcode) = payload.barcode {
        update_expr.push("barcode = :barcode");
        expr_values.insert(":barcode".to_string(), AttributeValue::S(barcode));
    }
    if let Some(sku) = payload.sku {
        update_expr.push("sku = :sku");
        expr_values.insert(":sku".to_string(), AttributeValue::S(sku));
    }
    if let Some(image_url) = payload.image_url {
        update_expr.push("image_url = :image_url");
        expr_values.insert(":image_url".to_string(), AttributeValue::S(image_url));
    }
    if let Some(images) = payload.images {
        update_expr.push("images = :images");
        expr_values.insert(":images".to_string(), images_attribute(&images));
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
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
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

    get_product(client, table_name, user_id, product_id).await
}

/// Delete a product row plus its stored image object (best effort)
pub async fn delete_product(
    client: &DynamoClient,
    s3_client: &S3Client,
    bucket_name: &str,
    table_name: &str,
    user_id: &str,
    product_id: &str,
) -> Result<(), String> {
    let product = get_product(client, table_name, user_id, product_id).await?;

    if let Some(image_path) = &product.image_path {
        if let Err(e) = s3_client
            .delete_object()
            .bucket(bucket_name)
            .key(image_path)
            .send()
            .await
        {
            tracing::warn!(
                "Failed to delete S3 object {} for product {}: {}",
                image_path,
                product_id,
                e
            );
        }
    }

    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("PRODUCT#{}", product_id)))
        .send()
        .await
        .map_err(|e| format!("DynamoDB delete_item error: {}", e))?;

    Ok(())
}

/// Point the product at a freshly uploaded image. Called by the ingestion
/// pipeline strictly after the S3 upload succeeded, so a failed pipeline
/// run leaves the row untouched.
pub async fn update_product_image(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
    url: &str,
    path: &str,
) -> Result<Product, String> {
    let product = get_product(client, table_name, user_id, product_id).await?;

    // New URL becomes the cover; the rest of the gallery is preserved
    let mut images = product.images;
    if images.is_empty() {
        images.push(url.to_string());
    } else {
        images[0] = url.to_string();
    }

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("PRODUCT#{}", product_id)))
        .update_expression(
            "SET image_url = :url, image_path = :path, images = :images, updated_at = :updated_at",
        )
        .expression_attribute_values(":url", AttributeValue::S(url.to_string()))
        .expression_attribute_values(":path", AttributeValue::S(path.to_string()))
        .expression_attribute_values(":images", images_attribute(&images))
        .expression_attribute_values(
            ":updated_at",
            AttributeValue::S(chrono::Utc::now().to_rfc3339()),
        )
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    get_product(client, table_name, user_id, product_id).await
}

/// Write one synced value (price or stock) onto an existing product.
/// One row per call so a failing row can be isolated by the sync loop.
pub async fn apply_sync_value(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
    field: SyncField,
    value: f64,
) -> Result<(), String> {
    let attribute = match field {
        SyncField::Price => AttributeValue::N(value.to_string()),
        SyncField::StockQuantity => AttributeValue::N((value as i64).to_string()),
    };

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("PRODUCT#{}", product_id)))
        .update_expression(format!(
            "SET {} = :value, updated_at = :updated_at",
            field.attribute_name()
        ))
        .condition_expression("attribute_exists(PK)")
        .expression_attribute_values(":value", attribute)
        .expression_attribute_values(
            ":updated_at",
            AttributeValue::S(chrono::Utc::now().to_rfc3339()),
        )
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    Ok(())
}

/// How much of an order line a tracked stock counter can absorb without
/// going negative. Overselling is clamped, never written.
fn clamped_decrement(available: i64, requested: i64) -> i64 {
    requested.min(available.max(0)).max(0)
}

/// Decrement tracked stock after an order is placed. Untracked products
/// are left alone; an oversell decrements to zero and is logged. The
/// condition guards against a concurrent decrement draining the counter
/// below the clamp.
pub async fn decrement_stock(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
    product_id: &str,
    quantity: i64,
) -> Result<(), String> {
    let product = get_product(client, table_name, user_id, product_id).await?;
    if !product.track_stock {
        return Ok(());
    }

    let decrement = clamped_decrement(product.stock_quantity, quantity);
    if decrement < quantity {
        tracing::warn!(
            "Oversell clamped: product={}, available={}, requested={}",
            product_id,
            product.stock_quantity,
            quantity
        );
    }
    if decrement == 0 {
        return Ok(());
    }

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(format!("USER#{}", user_id)))
        .key("SK", AttributeValue::S(format!("PRODUCT#{}", product_id)))
        .update_expression("SET stock_quantity = stock_quantity - :qty")
        .condition_expression("stock_quantity >= :qty")
        .expression_attribute_values(":qty", AttributeValue::N(decrement.to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::clamped_decrement;

    #[test]
    fn decrements_never_exceed_available_stock() {
        assert_eq!(clamped_decrement(10, 3), 3);
        assert_eq!(clamped_decrement(3, 10), 3);
        assert_eq!(clamped_decrement(0, 5), 0);
    }

    #[test]
    fn corrupt_negative_counters_are_not_decremented_further() {
        assert_eq!(clamped_decrement(-2, 5), 0);
        assert_eq!(clamped_decrement(5, -1), 0);
    }
}
