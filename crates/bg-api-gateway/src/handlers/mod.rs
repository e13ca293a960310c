//! Route handlers.

pub mod governance;
pub mod system;
pub mod voting;
