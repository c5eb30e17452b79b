pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{authorize, require_access, AccessRequirement, Gate};
pub use rate_limit::rate_limit_middleware;
pub use response::{ApiResponse, ApiResult};
