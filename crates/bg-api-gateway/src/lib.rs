//! # Bounty Governance API Gateway
//!
//! HTTP front end for reviewer/manager administration and submission voting.
//!
//! ## Architecture
//!
//! ```text
//!   client ──HTTP──▶ ┌──────────────────────────────────────────┐
//!                    │ Middleware: Trace → Metrics → Timeout →   │
//!                    │             CORS                          │
//!                    ├──────────────────────────────────────────┤
//!                    │ /api/*      handlers::{governance,voting}│
//!                    │ /health     handlers::system             │
//!                    │ /metrics    handlers::system             │
//!                    └───────────────────┬──────────────────────┘
//!                                        │ Arc<dyn GovernanceApi>
//!                                        ▼
//!                               bg-governance service
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body / query |
//! |--------|------|--------------|
//! | POST   | `/api/addReviewer` | `{program, reviewerAddress}` |
//! | DELETE | `/api/removeReviewer` | `{program, address}` |
//! | GET    | `/api/listReviewers` | `?program=` |
//! | POST   | `/api/addManager` | `{program, managerAddress}` |
//! | PUT    | `/api/changeManager` | `{program, newManagerAddress}` |
//! | DELETE | `/api/removeManager` | `{program}` |
//! | GET    | `/api/getManager` | `?program=` |
//! | POST   | `/api/submissions/:id/castReviewerVote` | `{reviewerAddress, vote, severity?, comment?}` |
//! | POST   | `/api/submissions/:id/castManagerVote` | `{managerAddress, vote, severity?, comment?}` |
//! | POST   | `/api/submissions/:id/finalize` | `{managerAddress}` |
//! | GET    | `/api/submissionStatus` | `?submissionId=` |
//!
//! ## Usage
//!
//! ```ignore
//! use bg_api_gateway::{ApiGatewayService, GatewayConfig};
//!
//! let gateway = ApiGatewayService::new(GatewayConfig::default(), api, metrics)?;
//! gateway.start(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::{ApiError, ApiResult, ConfigError, GatewayConfig, GatewayError};
pub use middleware::GatewayMetrics;
pub use router::{build_router, AppState};
pub use service::ApiGatewayService;
