//! Polling wait primitive
//!
//! A wait blocks the scenario until a page condition holds or its timeout
//! elapses. Either way the continuation runs exactly once and is handed a
//! [`WaitOutcome`], so the code after a wait can tell "the page never got
//! there" apart from "the page got there but shows the wrong thing".

use regex::Regex;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::browser::{Page, Selector};
use crate::common::{Error, Result};

/// A predicate over page state
#[derive(Debug, Clone)]
pub enum Condition {
    /// The current URL matches the pattern
    UrlMatches(Regex),
    /// The current URL does not match the pattern
    UrlNotMatches(Regex),
    /// At least one element matches the selector
    SelectorAppears(Selector),
    /// No element matches the selector
    SelectorDisappears(Selector),
}

impl Condition {
    pub fn url_matches(pattern: &str) -> Result<Self> {
        Ok(Self::UrlMatches(compile(pattern)?))
    }

    pub fn url_leaves(pattern: &str) -> Result<Self> {
        Ok(Self::UrlNotMatches(compile(pattern)?))
    }

    pub fn appears(selector: Selector) -> Self {
        Self::SelectorAppears(selector)
    }

    pub fn disappears(selector: Selector) -> Self {
        Self::SelectorDisappears(selector)
    }

    /// Probe the page once
    pub async fn holds<P: Page + ?Sized>(&self, page: &P) -> Result<bool> {
        match self {
            Self::UrlMatches(re) => Ok(re.is_match(&page.current_url().await?)),
            Self::UrlNotMatches(re) => Ok(!re.is_match(&page.current_url().await?)),
            Self::SelectorAppears(sel) => page.exists(sel).await,
            Self::SelectorDisappears(sel) => Ok(!page.exists(sel).await?),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UrlMatches(re) => write!(f, "URL to match /{}/", re.as_str()),
            Self::UrlNotMatches(re) => write!(f, "URL to leave /{}/", re.as_str()),
            Self::SelectorAppears(sel) => write!(f, "{} to appear", sel),
            Self::SelectorDisappears(sel) => write!(f, "{} to disappear", sel),
        }
    }
}

/// Compile a URL pattern
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    /// The condition held
    Resolved(T),
    /// The timeout elapsed first
    TimedOut,
}

impl<T> WaitOutcome<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    pub fn resolved(self) -> Option<T> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::TimedOut => None,
        }
    }
}

/// Polls page conditions at a fixed interval
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    poll_interval: Duration,
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

impl Waiter {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Block until `condition` holds or `timeout` elapses
    ///
    /// Resolves with the time it took for the condition to hold. A check that
    /// errors (e.g. the page is mid-navigation) counts as "not yet". The
    /// condition is always checked once more at the deadline.
    pub async fn until<P: Page + ?Sized>(
        &self,
        page: &P,
        condition: &Condition,
        timeout: Duration,
    ) -> WaitOutcome<Duration> {
        let start = Instant::now();
        let deadline = start + timeout;

        loop {
            match condition.holds(page).await {
                Ok(true) => {
                    let elapsed = start.elapsed();
                    let elapsed_ms = elapsed.as_millis() as u64;
                    tracing::debug!(%condition, elapsed_ms, "wait resolved");
                    return WaitOutcome::Resolved(elapsed);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(%condition, error = %e, "condition check failed");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                let timeout_ms = timeout.as_millis() as u64;
                tracing::warn!(%condition, timeout_ms, "wait timed out");
                return WaitOutcome::TimedOut;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Wait, then hand the outcome to `continuation`
    ///
    /// The continuation runs exactly once, whether the condition held or the
    /// wait timed out.
    pub async fn then<P, F, T>(
        &self,
        page: &P,
        condition: &Condition,
        timeout: Duration,
        continuation: F,
    ) -> T
    where
        P: Page + ?Sized,
        F: FnOnce(WaitOutcome<Duration>) -> T,
    {
        let outcome = self.until(page, condition, timeout).await;
        continuation(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{Change, FakePage};

    #[tokio::test(start_paused = true)]
    async fn test_resolves_once_condition_holds() {
        let page = FakePage::new("http://dash.test/login")
            .schedule(Duration::from_millis(120), Change::url("http://dash.test/"));
        let cond = Condition::url_leaves("/login").unwrap();

        let mut calls = 0;
        let outcome = Waiter::default()
            .then(&page, &cond, Duration::from_millis(200), |o| {
                calls += 1;
                o
            })
            .await;

        assert_eq!(calls, 1);
        let elapsed = outcome.resolved().expect("should resolve");
        assert!(elapsed >= Duration::from_millis(120));
        assert!(elapsed <= Duration::from_millis(170));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_still_runs_continuation_once() {
        let page = FakePage::new("http://dash.test/login");
        let cond = Condition::url_leaves("/login").unwrap();

        let start = Instant::now();
        let mut seen = Vec::new();
        Waiter::default()
            .then(&page, &cond, Duration::from_millis(200), |o| seen.push(o))
            .await;

        assert_eq!(seen, vec![WaitOutcome::TimedOut]);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_true_resolves_immediately() {
        let page = FakePage::new("about:blank").with_element(".launch-btn", "Launch");
        let cond = Condition::appears(Selector::css(".launch-btn"));

        let outcome = Waiter::default()
            .until(&page, &cond, Duration::from_secs(10))
            .await;
        assert_eq!(outcome, WaitOutcome::Resolved(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_while_selector_present() {
        let page = FakePage::new("about:blank")
            .with_element(".launch-btn[disabled]", "Launching")
            .schedule(Duration::from_secs(3), Change::hide(".launch-btn[disabled]"));
        let cond = Condition::disappears(Selector::css(".launch-btn[disabled]"));

        let outcome = Waiter::default()
            .until(&page, &cond, Duration::from_secs(300))
            .await;
        let elapsed = outcome.resolved().unwrap();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(3) + Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_at_deadline_counts() {
        let page = FakePage::new("http://dash.test/github/auth")
            .schedule(Duration::from_millis(200), Change::url("http://dash.test/github"));
        let cond = Condition::url_matches("/github$").unwrap();

        let outcome = Waiter::new(Duration::from_millis(50))
            .until(&page, &cond, Duration::from_millis(200))
            .await;
        assert!(outcome.is_resolved());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Condition::url_matches("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_condition_display() {
        let cond = Condition::url_leaves("/login").unwrap();
        assert_eq!(cond.to_string(), "URL to leave //login/");
        let cond = Condition::appears(Selector::css(".launch-btn"));
        assert_eq!(cond.to_string(), "css `.launch-btn` to appear");
    }
}
