pub mod auth;

pub use auth::{auth_context_middleware, Auth, VERIFIED_CLAIMS_HEADER};
