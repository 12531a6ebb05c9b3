pub mod capabilities;
pub mod claims;
pub mod club_capabilities;
pub mod service;

pub use capabilities::{system_capabilities, SystemCapability, SystemRole};
pub use claims::{extract_auth_context, AuthContext, ClaimsError};
pub use club_capabilities::{club_capabilities, ClubCapability, ClubRole};
pub use service::{AuthorizationService, CapabilityCheck, CapabilityResolver, MatrixResolver};
