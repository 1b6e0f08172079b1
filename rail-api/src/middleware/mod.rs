pub mod auth;

pub use auth::{admin_key_middleware, customer_auth_middleware, issue_token, Claims};
