//! Gateway domain: configuration, errors and request/response bodies.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig, TimeoutConfig};
pub use error::{ApiError, ApiResult, GatewayError};
