pub mod model;
pub mod service;

pub use model::{Brand, CreateBrandPayload, UpdateBrandPayload};
pub use service::*;
