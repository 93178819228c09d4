//! Constants for the lambda-event-router packages.
//!
//! Environment variable names, defaults and fixed response messages live here
//! so the dispatcher and the bundled middlewares agree on them.

/// Stage value meaning "the path carries no stage prefix".
pub const DEFAULT_STAGE: &str = "$default";

/// Environment variable names for configuration.
pub mod env_vars {
    /// Requests-per-minute limit applied by the rate limiter.
    pub const RATE_LIMIT_RPM: &str = "ROUTER_RATE_LIMIT_RPM";

    /// Requests-per-second limit applied by the rate limiter.
    pub const RATE_LIMIT_RPS: &str = "ROUTER_RATE_LIMIT_RPS";

    /// Set to "true" to log the computed rates of every request at info level.
    pub const RATE_LIMIT_LOG: &str = "ROUTER_RATE_LIMIT_LOG";
}

/// Default values for configuration parameters.
pub mod defaults {
    /// Rate logging is off unless requested.
    pub const RATE_LIMIT_LOG: bool = false;
}

/// Messages placed in the `message` field of error bodies.
pub mod messages {
    pub const INTERNAL_ERROR: &str = "Internal error.";
    pub const UNKNOWN_ERROR: &str = "Unknown internal server error!";
    pub const MALFORMED_JSON: &str = "Malformed JSON body.";
    pub const TOO_MANY_REQUESTS: &str = "Too many requests.";
}

/// HTTP status codes produced by the router and its collaborators.
pub mod status {
    pub const OK: u16 = 200;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const TOO_MANY_REQUESTS: u16 = 429;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}
