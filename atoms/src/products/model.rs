use serde::{Deserialize, Serialize};

/// Product domain model - one catalog row owned by a representative.
/// reference_code / barcode are the PROCV join keys; the sync never
/// creates products, only mutates price/stock on existing rows.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub product_id: String,
    pub user_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub price: f64,
    pub stock_quantity: i64,
    pub track_stock: bool,
    pub reference_code: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    /// Primary (cover) image URL
    pub image_url: Option<String>,
    /// S3 key behind image_url, kept so the object can be deleted with the row
    pub image_path: Option<String>,
    /// Ordered gallery, first entry = cover
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductPayload {
    pub name: String,
    pub brand: Option<String>,
    pub price: f64,
    pub stock_quantity: Option<i64>,
    pub track_stock: Option<bool>,
    pub reference_code: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductPayload {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub track_stock: Option<bool>,
    pub reference_code: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,
}
