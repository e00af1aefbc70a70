//! Dashboard scenario
//!
//! The scenario is a fixed sequence of [`DashboardStep`]s run by
//! [`ScenarioRunner`] against any [`crate::browser::Page`].

pub mod report;
pub mod runner;
pub mod scratch;
pub mod steps;
pub mod wait;

pub use report::{AssertionRecord, Outcome, Report};
pub use runner::{ScenarioResult, ScenarioRunner, StepStatus, StepSummary};
pub use scratch::Scratch;
pub use steps::DashboardStep;
pub use wait::{Condition, WaitOutcome, Waiter};
