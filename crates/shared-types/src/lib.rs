//! # Shared Types Crate
//!
//! Value types shared by every crate of the bounty governance workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: wallet addresses, program names and
//!   submission ids are defined once and validated at construction.
//! - **Case Normalization**: a `WalletAddress` is always lowercase, so two
//!   spellings of the same wallet can never produce two role entries.
//! - **Injectable Time**: domain code reads the clock through `TimeSource`.

pub mod address;
pub mod errors;
pub mod ids;
pub mod time;

pub use address::{normalize_address, WalletAddress};
pub use errors::*;
pub use ids::{ProgramName, SubmissionId};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, Timestamp};
