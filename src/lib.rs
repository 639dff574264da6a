//! Paperboy - a terminal dashboard for a scheduled arXiv research digest
//!
//! An external agent scans arXiv, ranks and summarizes papers and emails a
//! digest on a schedule owned by an external scheduler. Paperboy keeps the
//! user's preferences and digest history locally, mirrors the remote
//! schedule, and lets the user pause, resume or trigger a run.

pub mod agent;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod store;
pub mod sync;
pub mod tui;

pub use error::{PaperboyError, Result};
