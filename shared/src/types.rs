// ========== USER ==========
pub use repvendas_atoms::users::model::{
    CreateUserPayload, UpdateSubscriptionPayload, UpdateUserPayload, User,
};

// ========== PRODUCT ==========
pub use repvendas_atoms::products::model::{CreateProductPayload, Product, UpdateProductPayload};

// ========== ORDER ==========
pub use repvendas_atoms::orders::model::{CreateOrderPayload, Order, OrderItem, UpdateOrderPayload};

// ========== CLIENT ==========
pub use repvendas_atoms::clients::model::{Client, CreateClientPayload, UpdateClientPayload};

// ========== BRAND ==========
pub use repvendas_atoms::brands::model::{Brand, CreateBrandPayload, UpdateBrandPayload};

// ========== SETTINGS ==========
pub use repvendas_atoms::settings::model::{Settings, UpdateSettingsPayload};

// ========== IMAGE PIPELINE ==========
pub use crate::storage::ImageUploadResult;
pub use crate::transform::TransformedImage;
