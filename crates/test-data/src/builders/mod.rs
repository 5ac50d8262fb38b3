//! Fluent builder APIs for simulated sessions.
//!
//! The [`ScenarioBuilder`] drives a headless [`pathwalker::PathWalker`]
//! through a generated walk and reports how the session ended.

mod scenario;

pub use scenario::{ScenarioBuilder, ScenarioError, ScenarioMetrics, ScenarioResult, TrackShape};
