//! Middlewares shipped with the router.

mod json_body;
mod rate_limiter;

pub use json_body::JsonBody;
pub use rate_limiter::RateLimiter;
