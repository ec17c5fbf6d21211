pub mod model;
pub mod service;

pub use model::{Client, CreateClientPayload, UpdateClientPayload};
pub use service::*;
