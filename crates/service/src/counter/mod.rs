//! Version counters keyed by (target, branch).

pub mod domain;
pub mod service;

pub use domain::{VersionKey, VersionString};
pub use service::CounterService;
