// Re-export model types and service functions
pub mod model;
pub mod service;
pub mod http;

pub use model::{CreateOrderPayload, Order, OrderItem, UpdateOrderPayload};
pub use service::*;
pub use http::*;
