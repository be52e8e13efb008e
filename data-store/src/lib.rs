pub mod models;
pub mod schema;
pub mod store;
