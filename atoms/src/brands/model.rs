use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Brand {
    pub brand_id: String,
    pub user_id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBrandPayload {
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBrandPayload {
    pub name: Option<String>,
    pub logo_url: Option<String>,
}
