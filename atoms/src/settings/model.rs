use serde::{Deserialize, Serialize};

/// Storefront configuration for one representative. A single row per
/// user (SK = "SETTINGS"), upserted on PATCH.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub user_id: String,
    pub store_name: String,
    pub slug: Option<String>,
    pub welcome_message: Option<String>,
    /// Optional catalog gate - buyers must supply it to browse
    pub catalog_password: Option<String>,
    /// Where order-confirmation mail is sent; unset disables dispatch
    pub notification_email: Option<String>,
    pub updated_at: Option<String>,
}

impl Settings {
    pub fn defaults(user_id: &str) -> Self {
        Settings {
            user_id: user_id.to_string(),
            store_name: "Minha Loja".to_string(),
            slug: None,
            welcome_message: None,
            catalog_password: None,
            notification_email: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsPayload {
    pub store_name: Option<String>,
    pub slug: Option<String>,
    pub welcome_message: Option<String>,
    pub catalog_password: Option<String>,
    pub notification_email: Option<String>,
}
