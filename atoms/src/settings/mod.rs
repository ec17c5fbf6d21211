pub mod model;
pub mod service;

pub use model::{Settings, UpdateSettingsPayload};
pub use service::*;
