//! Scenario runner
//!
//! Runs the dashboard steps in order against one page, collecting assertion
//! records. A step that errors is recorded and the run moves on, unless
//! the abort policy says to stop after the first failing step.

use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use tokio::time::Instant;

use crate::browser::Page;
use crate::common::config::Config;

use super::report::{AssertionRecord, Report};
use super::scratch::Scratch;
use super::steps::{execute_step, DashboardStep, StepContext};
use super::wait::Waiter;

pub const SCENARIO_NAME: &str = "Dashboard integration test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepSummary {
    pub name: String,
    pub status: StepStatus,
    pub assertions: usize,
    pub failures: usize,
    pub duration_ms: u64,
}

/// Result of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    /// RFC 3339 start time
    pub started_at: String,
    pub duration_ms: u64,
    pub steps: Vec<StepSummary>,
    pub assertions: Vec<AssertionRecord>,
    /// Name given to the launched example app, if that step got that far
    pub app_name: Option<String>,
}

impl ScenarioResult {
    pub fn failure_count(&self) -> usize {
        self.assertions.iter().filter(|a| !a.passed()).count()
    }

    pub fn step(&self, step: DashboardStep) -> Option<&StepSummary> {
        self.steps.iter().find(|s| s.name == step.name())
    }
}

pub struct ScenarioRunner<'a> {
    page: &'a dyn Page,
    config: &'a Config,
    steps: Vec<DashboardStep>,
    scratch: Scratch,
    quiet: bool,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(page: &'a dyn Page, config: &'a Config) -> Self {
        Self {
            page,
            config,
            steps: DashboardStep::ALL.to_vec(),
            scratch: Scratch::new(config.run.max_app_name_length),
            quiet: false,
        }
    }

    /// Run only these steps, in the given order
    pub fn with_steps(mut self, steps: impl IntoIterator<Item = DashboardStep>) -> Self {
        self.steps = steps.into_iter().collect();
        self
    }

    pub fn with_scratch(mut self, scratch: Scratch) -> Self {
        self.scratch = scratch;
        self
    }

    /// Suppress terminal output
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub async fn run(self) -> ScenarioResult {
        let Self {
            page,
            config,
            steps,
            mut scratch,
            quiet,
        } = self;

        let started_at = Utc::now().to_rfc3339();
        let run_start = Instant::now();
        let mut report = if quiet { Report::quiet() } else { Report::new() };
        let waiter = Waiter::new(config.timeouts.poll_interval());
        let mut summaries = Vec::with_capacity(steps.len());
        let mut aborted = false;

        if !quiet {
            println!(
                "\n{} {}",
                "Running Test:".blue().bold(),
                SCENARIO_NAME.white().bold()
            );
            println!("  {}", config.dashboard.url.dimmed());
            println!("\n{}", "Steps:".cyan());
        }
        tracing::info!(url = %config.dashboard.url, steps = steps.len(), "scenario started");

        for (i, step) in steps.iter().copied().enumerate() {
            let step_num = i + 1;

            if aborted {
                if !quiet {
                    println!(
                        "  {} Step {}: {} {}",
                        "-".dimmed(),
                        step_num,
                        step.name().dimmed(),
                        "(skipped)".dimmed()
                    );
                }
                summaries.push(StepSummary {
                    name: step.name().to_string(),
                    status: StepStatus::Skipped,
                    assertions: 0,
                    failures: 0,
                    duration_ms: 0,
                });
                continue;
            }

            if !quiet {
                println!("  {} Step {}: {}", "▸".cyan(), step_num, step.name());
            }
            report.begin_step(step.name());
            let first_record = report.records().len();
            let step_start = Instant::now();

            let result = {
                let mut cx = StepContext {
                    page,
                    report: &mut report,
                    scratch: &mut scratch,
                    waiter,
                    config,
                };
                execute_step(step, &mut cx).await
            };

            if let Err(e) = &result {
                tracing::error!(step = step.name(), error = %e, "step ended early");
                report.step_error("step did not complete", e);
            }

            let failures = report.failures_since(first_record);
            let status = if failures == 0 {
                StepStatus::Passed
            } else {
                StepStatus::Failed
            };
            summaries.push(StepSummary {
                name: step.name().to_string(),
                status,
                assertions: report.records().len() - first_record,
                failures,
                duration_ms: step_start.elapsed().as_millis() as u64,
            });

            if status == StepStatus::Failed && config.run.abort_on_failure {
                tracing::warn!(step = step.name(), "aborting after failed step");
                aborted = true;
            }
        }

        let passed = report.passed();
        let assertions = report.done();
        let result = ScenarioResult {
            name: SCENARIO_NAME.to_string(),
            passed,
            started_at,
            duration_ms: run_start.elapsed().as_millis() as u64,
            steps: summaries,
            assertions,
            app_name: scratch.generated_app_name().map(str::to_string),
        };

        if !quiet {
            print_summary(&result);
        }
        tracing::info!(
            passed = result.passed,
            failures = result.failure_count(),
            duration_ms = result.duration_ms,
            "scenario finished"
        );
        result
    }
}

fn print_summary(result: &ScenarioResult) {
    let total = result.assertions.len();
    let failed = result.failure_count();

    if result.passed {
        println!(
            "\n{} {} {}\n",
            "✓".green().bold(),
            "Test Passed".green().bold(),
            format!("({} assertions)", total).dimmed()
        );
    } else {
        println!(
            "\n{} {} {}\n",
            "✗".red().bold(),
            "Test Failed".red().bold(),
            format!("({} of {} assertions failed)", failed, total).dimmed()
        );
    }
}
