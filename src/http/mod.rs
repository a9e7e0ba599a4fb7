//! HTTP Surface: routing, bearer auth, schema validation, OpenAPI docs

pub mod auth;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use state::AppState;
