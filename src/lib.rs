//! dashboard-e2e - end-to-end browser scenario for the dashboard
//!
//! This library provides the scenario runner, the page capability layer and
//! a WebDriver client to drive a real browser with.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;
pub mod webdriver;

// Re-export commonly used types for tests
pub use common::{Error, Result};
