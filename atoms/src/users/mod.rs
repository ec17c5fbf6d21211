pub mod model;
pub mod service;

pub use model::{CreateUserPayload, UpdateSubscriptionPayload, UpdateUserPayload, User};
pub use service::*;
