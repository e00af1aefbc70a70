//! W3C WebDriver protocol implementation
//!
//! This module handles communication with WebDriver servers such as
//! chromedriver and geckodriver.

mod client;
pub mod types;

pub use client::WebDriverClient;
pub use types::{ElementRef, Locator};
