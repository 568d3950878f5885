//! gpupolicy-engine: GPU allocation policy evaluation
//!
//! This crate decides which devices a policy allows and in what order:
//! - Pool and ruleset registry
//! - Pool admission and requirement checks
//! - Device scoring and recommendation ranking

pub mod engine;
pub mod evaluator;
pub mod ranker;
pub mod registry;

pub use engine::PolicyEngine;
pub use evaluator::{matches_pool, meets_requirements, Evaluator};
pub use ranker::{DeviceScorer, Ranker, Recommendation, WeightedScorer};
pub use registry::Registry;
