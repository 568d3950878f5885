//! gpupolicy-core: Core types for the GPU policy engine
//!
//! This crate provides the data model consumed by the evaluator and ranker:
//! - Device snapshots
//! - Pools, rules, rulesets and policy documents
//! - Per-request requirements
//! - Configuration, logging setup and error handling

pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod policy;
pub mod pool;
pub mod requirements;
pub mod rule;

pub use config::*;
pub use device::*;
pub use error::*;
pub use logging::init_logging;
pub use policy::*;
pub use pool::*;
pub use requirements::*;
pub use rule::*;
