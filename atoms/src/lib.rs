// Domain atoms: one module per table-backed entity.
// Services take AWS clients as arguments, they never own global state.

pub mod brands;
pub mod clients;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
