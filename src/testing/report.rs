//! Per-assertion reporting
//!
//! Every check the scenario makes lands here as an [`AssertionRecord`]. The
//! report prints each record as it is made, in the same colored style as the
//! step output, unless it was created quiet.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::browser::Selector;
use crate::common::Error;

/// How a single assertion ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed {
        detail: String,
    },
    /// The wait preceding the assertion gave up before the page got there
    TimedOut {
        condition: String,
        waited_ms: u64,
    },
    /// The page layer failed before the step could finish
    StepError {
        message: String,
    },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionRecord {
    pub step: String,
    pub label: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AssertionRecord {
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }
}

/// Timeout of the most recent wait, if it gave up
#[derive(Debug, Clone)]
struct PendingTimeout {
    condition: String,
    waited_ms: u64,
}

/// Collects assertion records for one run
#[derive(Debug, Default)]
pub struct Report {
    step: String,
    records: Vec<AssertionRecord>,
    pending_timeout: Option<PendingTimeout>,
    quiet: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report that records without printing
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// Attribute the following records to `step`
    pub fn begin_step(&mut self, step: &str) {
        self.step = step.to_string();
        self.pending_timeout = None;
    }

    /// Note how the last wait ended
    ///
    /// After a timed-out wait, failing assertions are recorded as
    /// [`Outcome::TimedOut`] until the next wait or step begins. Passing
    /// assertions are unaffected.
    pub fn wait_ended(&mut self, condition: &str, timed_out: Option<Duration>) {
        self.pending_timeout = timed_out.map(|waited| PendingTimeout {
            condition: condition.to_string(),
            waited_ms: waited.as_millis() as u64,
        });
    }

    pub fn assert_true(&mut self, condition: bool, label: &str) -> bool {
        self.check(condition, label, || "condition was false".to_string())
    }

    pub fn assert_equal<T: PartialEq + Debug>(
        &mut self,
        actual: T,
        expected: T,
        label: &str,
    ) -> bool {
        let ok = actual == expected;
        self.check(ok, label, || format!("expected {:?}, got {:?}", expected, actual))
    }

    /// Record whether `selector` matched an element
    pub fn assert_found(&mut self, found: bool, selector: &Selector, label: &str) -> bool {
        self.check(found, label, || format!("no element matches {}", selector))
    }

    /// Record an error that ended the current step early
    pub fn step_error(&mut self, label: &str, error: &Error) {
        self.push(
            label,
            Outcome::StepError {
                message: error.to_string(),
            },
        );
    }

    fn check(&mut self, ok: bool, label: &str, detail: impl FnOnce() -> String) -> bool {
        let outcome = if ok {
            Outcome::Passed
        } else if let Some(t) = &self.pending_timeout {
            Outcome::TimedOut {
                condition: t.condition.clone(),
                waited_ms: t.waited_ms,
            }
        } else {
            Outcome::Failed { detail: detail() }
        };
        self.push(label, outcome);
        ok
    }

    fn push(&mut self, label: &str, outcome: Outcome) {
        let record = AssertionRecord {
            step: self.step.clone(),
            label: label.to_string(),
            outcome,
        };
        if !self.quiet {
            print_record(&record);
        }
        match &record.outcome {
            Outcome::Passed => tracing::debug!(step = %record.step, label, "assertion passed"),
            outcome => tracing::warn!(step = %record.step, label, ?outcome, "assertion failed"),
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[AssertionRecord] {
        &self.records
    }

    /// Failures recorded since record index `from`
    pub fn failures_since(&self, from: usize) -> usize {
        self.records[from.min(self.records.len())..]
            .iter()
            .filter(|r| !r.passed())
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures_since(0)
    }

    pub fn passed(&self) -> bool {
        self.failure_count() == 0
    }

    /// Finish the run and hand back every record
    pub fn done(self) -> Vec<AssertionRecord> {
        tracing::info!(
            assertions = self.records.len(),
            failures = self.failure_count(),
            "report complete"
        );
        self.records
    }
}

fn print_record(record: &AssertionRecord) {
    match &record.outcome {
        Outcome::Passed => println!("    {} {}", "✓".green(), record.label),
        Outcome::Failed { detail } => {
            println!("    {} {}: {}", "✗".red(), record.label, detail.dimmed())
        }
        Outcome::TimedOut {
            condition,
            waited_ms,
        } => println!(
            "    {} {}: {}",
            "⏱".yellow(),
            record.label,
            format!("gave up waiting for {} after {} ms", condition, waited_ms).dimmed()
        ),
        Outcome::StepError { message } => {
            println!("    {} {}: {}", "✗".red().bold(), record.label, message.red())
        }
    }
}
