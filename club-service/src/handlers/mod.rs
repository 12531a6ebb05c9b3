//! HTTP handlers. Thin by design: decode input, delegate to the domain
//! services, shape the response.

pub mod club;
pub mod context;
pub mod invitation;
pub mod membership;
pub mod ride;

use serde::Deserialize;

/// Common pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}
