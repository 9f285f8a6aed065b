//! Multi-row locking over a CAS store
//!
//! This module provides:
//! - Lock data model and lifecycle phases
//! - Acquire with time-budget restarts
//! - Conditional release

mod model;
mod service;

pub use model::*;
pub use service::*;
