//! Browser capability set
//!
//! The scenario only ever talks to the page through [`Page`]. A live run
//! uses [`DriverPage`] on top of a WebDriver session; the test suite uses
//! [`FakePage`], a scripted in-memory double.

mod driver;
pub mod fake;

use async_trait::async_trait;
use std::fmt;

use crate::common::{Error, Result};

pub use driver::DriverPage;
pub use fake::FakePage;

/// How an element is addressed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(s: impl Into<String>) -> Self {
        Self::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Self::XPath(s.into())
    }

    /// The raw selector text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }

    /// Append a CSS suffix such as `:checked` or `[disabled]`
    ///
    /// Only CSS selectors take a suffix; XPath needs its own predicate.
    pub fn with_suffix(&self, suffix: &str) -> Result<Self> {
        match self {
            Self::Css(s) => Ok(Self::Css(format!("{}{}", s, suffix))),
            Self::XPath(_) => Err(Error::SelectorSuffix {
                selector: self.to_string(),
                suffix: suffix.to_string(),
            }),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{}`", s),
            Self::XPath(s) => write!(f, "xpath `{}`", s),
        }
    }
}

/// Page operations the scenario relies on
///
/// Every method acts on the single page owned by the run. Element lookups
/// that find nothing fail with [`crate::Error::ElementNotFound`], except
/// [`Page::exists`] which reports `false`.
#[async_trait]
pub trait Page: Send + Sync {
    /// Load a URL in the page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// URL currently shown
    async fn current_url(&self) -> Result<String>;

    /// Whether at least one element matches
    async fn exists(&self, selector: &Selector) -> Result<bool>;

    /// Click the first matching element
    async fn click(&self, selector: &Selector) -> Result<()>;

    /// Replace the values of fields inside a form, optionally submitting it
    async fn fill_form(
        &self,
        form: &Selector,
        fields: &[(Selector, String)],
        submit: bool,
    ) -> Result<()>;

    /// Type text into the first matching element, keeping its current value
    async fn type_into(&self, selector: &Selector, text: &str) -> Result<()>;

    /// Rendered text of the first matching element
    async fn text(&self, selector: &Selector) -> Result<String>;
}
