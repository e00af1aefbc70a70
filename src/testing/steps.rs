//! The dashboard scenario, step by step
//!
//! Steps share one page and run strictly in order: each expects the page
//! where the previous step left it. Every check goes through the run's
//! [`Report`]; only page-layer errors escape a step.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::browser::{Page, Selector};
use crate::common::config::Config;
use crate::common::{join_url, Result};

use super::report::Report;
use super::scratch::Scratch;
use super::wait::{compile, Condition, WaitOutcome, Waiter};

const LOGIN_FORM: &str = "form";
const PASSWORD_INPUT: &str = r#"//input[@type="password"]"#;

const GITHUB_BUTTON: &str = r#".btn-green[href="/github"]"#;
const GITHUB_BUTTON_TEXT: &str = "Connect with Github";
const GENERATE_TOKEN_LINK: &str = r#"a[href^="https://github.com/settings/tokens/new"]"#;
const TOKEN_FORM: &str = "form";
const TOKEN_INPUT: &str = r#"//input[@type="text"]"#;

const STARRED_LINK: &str = r#"a[href$="github?type=star"]"#;

const EXAMPLE_REPO_LINK: &str = r#"a[href*="flynn-examples"]"#;
const LAUNCH_COMMIT_BUTTON: &str = ".launch-btn";
const LAUNCH_BUTTON: &str = "#secondary .launch-btn";
const NAME_INPUT: &str = "#secondary .name+input[type=text]";
const POSTGRES_CHECKBOX: &str = "#secondary .name+input[type=checkbox]";
const ENV_KEY_INPUT: &str = "#secondary .edit-env input";
const ENV_VALUE_INPUT: &str = "#secondary .edit-env input+span+input";
const LAUNCHED_TEXT: &str = "Continue";

const ENV_EDITOR_PATH: &str = "apps/dashboard/env";
const ENV_FORM: &str = "#secondary";
const ENV_TEXT_INPUT: &str = "#secondary input[type=text]";
const GITHUB_TOKEN_ENV: &str = "#secondary input[value=GITHUB_TOKEN]";
const GITHUB_TOKEN_FIELD: &str = "input[value=GITHUB_TOKEN]";
const SAVE_ENV_BUTTON: &str = "#secondary .edit-env+button";

/// One named phase of the scenario, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DashboardStep {
    Login,
    GithubAuth,
    NavigateGithubStarred,
    LaunchExampleRepo,
    RemoveGithubToken,
}

impl DashboardStep {
    /// Every step, in declaration order
    pub const ALL: [DashboardStep; 5] = [
        Self::Login,
        Self::GithubAuth,
        Self::NavigateGithubStarred,
        Self::LaunchExampleRepo,
        Self::RemoveGithubToken,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::GithubAuth => "GithubAuth",
            Self::NavigateGithubStarred => "NavigateGithubStarred",
            Self::LaunchExampleRepo => "LaunchExampleRepo",
            Self::RemoveGithubToken => "RemoveGithubToken",
        }
    }
}

impl fmt::Display for DashboardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a step can touch
pub struct StepContext<'a> {
    pub page: &'a dyn Page,
    pub report: &'a mut Report,
    pub scratch: &'a mut Scratch,
    pub waiter: Waiter,
    pub config: &'a Config,
}

impl<'a> StepContext<'a> {
    /// Wait for `condition`, noting a timeout on the report
    async fn wait(&mut self, condition: Condition, timeout: Duration) -> WaitOutcome<Duration> {
        let report = &mut *self.report;
        let described = condition.to_string();
        self.waiter
            .then(self.page, &condition, timeout, |outcome| {
                report.wait_ended(&described, outcome.is_timed_out().then_some(timeout));
                outcome
            })
            .await
    }

    async fn assert_exists(&mut self, selector: &Selector, label: &str) -> Result<bool> {
        let found = self.page.exists(selector).await?;
        Ok(self.report.assert_found(found, selector, label))
    }

    /// Assert whether the current URL matches `pattern`
    async fn assert_url(&mut self, pattern: &str, matches: bool, label: &str) -> Result<bool> {
        let re = compile(pattern)?;
        let url = self.page.current_url().await?;
        Ok(self.report.assert_true(re.is_match(&url) == matches, label))
    }

    /// Text of `selector`, or empty when nothing matches
    async fn text_or_empty(&self, selector: &Selector) -> Result<String> {
        if self.page.exists(selector).await? {
            Ok(self.page.text(selector).await?.trim().to_string())
        } else {
            Ok(String::new())
        }
    }
}

/// Run one step against the page
pub async fn execute_step(step: DashboardStep, cx: &mut StepContext<'_>) -> Result<()> {
    tracing::info!(step = step.name(), "step started");
    match step {
        DashboardStep::Login => login(cx).await,
        DashboardStep::GithubAuth => github_auth(cx).await,
        DashboardStep::NavigateGithubStarred => navigate_github_starred(cx).await,
        DashboardStep::LaunchExampleRepo => launch_example_repo(cx).await,
        DashboardStep::RemoveGithubToken => remove_github_token(cx).await,
    }
}

async fn login(cx: &mut StepContext<'_>) -> Result<()> {
    let url = cx.config.dashboard.url.clone();
    cx.page.navigate(&url).await?;

    // The dashboard redirects to /login client-side
    let default_wait = cx.config.timeouts.default_wait();
    cx.wait(Condition::url_matches("/login")?, default_wait).await;
    cx.assert_url("/login", true, "Login page loaded").await?;

    let token = cx.config.dashboard.login_token.clone();
    cx.page
        .fill_form(
            &Selector::css(LOGIN_FORM),
            &[(Selector::xpath(PASSWORD_INPUT), token)],
            true,
        )
        .await?;

    cx.wait(Condition::url_leaves("/login")?, default_wait).await;
    cx.assert_url("/login", false, "Login successful").await?;
    Ok(())
}

async fn github_auth(cx: &mut StepContext<'_>) -> Result<()> {
    let button = Selector::css(GITHUB_BUTTON);
    cx.assert_exists(&button, "Github button exists").await?;
    let text = cx.text_or_empty(&button).await?;
    cx.report.assert_equal(
        text.as_str(),
        GITHUB_BUTTON_TEXT,
        r#"Github button reads "Connect with Github""#,
    );
    cx.page.click(&button).await?;

    let default_wait = cx.config.timeouts.default_wait();
    let auth_page = Condition::url_matches("/github/auth")?;
    cx.wait(auth_page, default_wait).await;
    let generate = Selector::css(GENERATE_TOKEN_LINK);
    cx.assert_exists(&generate, "Generate token button exists").await?;

    let token = cx.config.dashboard.github_token.clone();
    cx.page
        .fill_form(
            &Selector::css(TOKEN_FORM),
            &[(Selector::xpath(TOKEN_INPUT), token)],
            true,
        )
        .await?;

    let auth_wait = cx.config.timeouts.auth_wait();
    cx.wait(Condition::url_matches("/github$")?, auth_wait).await;
    cx.assert_url("/github$", true, "Github auth successful").await?;
    Ok(())
}

async fn navigate_github_starred(cx: &mut StepContext<'_>) -> Result<()> {
    let link = Selector::css(STARRED_LINK);
    cx.assert_exists(&link, "Starred link exists").await?;
    cx.page.click(&link).await
}

async fn launch_example_repo(cx: &mut StepContext<'_>) -> Result<()> {
    let timeouts = cx.config.timeouts.clone();

    let repo_link = Selector::css(EXAMPLE_REPO_LINK);
    let listed = Condition::appears(repo_link.clone());
    cx.wait(listed, timeouts.selector_wait()).await;
    cx.assert_exists(&repo_link, "Example repo link exists").await?;
    cx.page.click(&repo_link).await?;

    let commit_button = Selector::css(LAUNCH_COMMIT_BUTTON);
    let commit_shown = Condition::appears(commit_button.clone());
    cx.wait(commit_shown, timeouts.default_wait()).await;
    cx.assert_exists(&commit_button, "Launch button exists").await?;
    cx.page.click(&commit_button).await?;

    let launch_button = Selector::css(LAUNCH_BUTTON);
    let modal_shown = Condition::appears(launch_button.clone());
    cx.wait(modal_shown, timeouts.selector_wait()).await;

    let name_input = Selector::css(NAME_INPUT);
    let postgres = Selector::css(POSTGRES_CHECKBOX);
    let env_key = Selector::css(ENV_KEY_INPUT);
    let env_value = Selector::css(ENV_VALUE_INPUT);
    cx.assert_exists(&launch_button, "Launch button exists (modal)").await?;
    cx.assert_exists(&name_input, "Name input exists").await?;
    cx.assert_exists(&postgres, "Postgres checkbox exists").await?;
    cx.assert_exists(&env_key, "Env key input exists").await?;
    cx.assert_exists(&env_value, "Env value input exists").await?;

    let app_name = cx.scratch.app_name().to_string();
    tracing::info!(app_name = %app_name, "launching example app");
    let name_field = [(name_input, app_name)];
    cx.page.fill_form(&Selector::css("body"), &name_field, false).await?;
    let key = cx.scratch.env_key().to_string();
    cx.page.type_into(&env_key, &key).await?;
    let value = cx.scratch.env_value().to_string();
    cx.page.type_into(&env_value, &value).await?;

    cx.page.click(&postgres).await?;
    let checked = postgres.with_suffix(":checked")?;
    cx.assert_exists(&checked, "Postgres checkbox checked").await?;

    cx.page.click(&launch_button).await?;
    let launching = Condition::disappears(launch_button.with_suffix("[disabled]")?);
    cx.wait(launching, timeouts.launch_wait()).await;
    let text = cx.text_or_empty(&launch_button).await?;
    cx.report
        .assert_equal(text.as_str(), LAUNCHED_TEXT, "Example app launched");
    Ok(())
}

async fn remove_github_token(cx: &mut StepContext<'_>) -> Result<()> {
    let url = join_url(&cx.config.dashboard.url, ENV_EDITOR_PATH);
    cx.page.navigate(&url).await?;
    let loaded = "Dashboard edit env page loaded";
    cx.assert_url("/apps/dashboard/env$", true, loaded).await?;

    let timeouts = cx.config.timeouts.clone();
    let editor_shown = Condition::appears(Selector::css(ENV_TEXT_INPUT));
    cx.wait(editor_shown, timeouts.default_wait()).await;
    let token_env = Selector::css(GITHUB_TOKEN_ENV);
    cx.assert_exists(&token_env, "GITHUB_TOKEN env is set").await?;

    let cleared = [(Selector::css(GITHUB_TOKEN_FIELD), String::new())];
    cx.page.fill_form(&Selector::css(ENV_FORM), &cleared, false).await?;
    cx.page.click(&Selector::css(SAVE_ENV_BUTTON)).await?;

    let saved = Condition::url_matches("/apps/dashboard$")?;
    cx.wait(saved, timeouts.save_wait()).await;
    cx.assert_url("/apps/dashboard$", true, "Env saved").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{Change, FakePage, PageCall};

    fn config() -> Config {
        let mut config = Config::default();
        config.dashboard.url = "http://dash.test".to_string();
        config.dashboard.login_token = "abc123".to_string();
        config.dashboard.github_token = "gh-token".to_string();
        config
    }

    async fn run_one(step: DashboardStep, page: &FakePage) -> (Result<()>, Report) {
        let config = config();
        let mut report = Report::quiet();
        let mut scratch = Scratch::with_stamp(30, 1_400_000_000_000);
        report.begin_step(step.name());
        let result = {
            let mut cx = StepContext {
                page,
                report: &mut report,
                scratch: &mut scratch,
                waiter: Waiter::new(config.timeouts.poll_interval()),
                config: &config,
            };
            execute_step(step, &mut cx).await
        };
        (result, report)
    }

    /// Env editor where the token input appears inside `token_form` after 80ms
    fn env_editor(token_form: &str) -> FakePage {
        let env_url = "http://dash.test/apps/dashboard/env";
        let shown = Duration::from_millis(80);
        FakePage::new("http://dash.test/apps")
            .on_navigate(env_url, Change::show(ENV_FORM))
            .on_navigate(env_url, Change::show("#primary"))
            .schedule(shown, Change::show(ENV_TEXT_INPUT))
            .schedule(shown, Change::show(GITHUB_TOKEN_ENV))
            .schedule(shown, Change::show_in(token_form, GITHUB_TOKEN_FIELD))
            .with_element(SAVE_ENV_BUTTON, "Save")
            .on_click_after(
                SAVE_ENV_BUTTON,
                Duration::from_secs(2),
                Change::url("http://dash.test/apps/dashboard"),
            )
    }

    #[test]
    fn test_step_order() {
        let names: Vec<_> = DashboardStep::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            [
                "Login",
                "GithubAuth",
                "NavigateGithubStarred",
                "LaunchExampleRepo",
                "RemoveGithubToken"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_starred_link_clicked_after_assert() {
        let page = FakePage::new("http://dash.test/github").with_element(STARRED_LINK, "Starred");
        let (result, report) = run_one(DashboardStep::NavigateGithubStarred, &page).await;

        result.unwrap();
        assert!(report.passed());
        assert_eq!(
            page.calls().await,
            vec![
                PageCall::Exists(STARRED_LINK.to_string()),
                PageCall::Click(STARRED_LINK.to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_starred_link_is_step_error() {
        let page = FakePage::new("http://dash.test/github");
        let (result, report) = run_one(DashboardStep::NavigateGithubStarred, &page).await;

        assert!(result.unwrap_err().is_missing_element());
        assert_eq!(report.failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_github_token_clears_value() {
        let page = env_editor(ENV_FORM);

        let (result, report) = run_one(DashboardStep::RemoveGithubToken, &page).await;
        result.unwrap();
        assert!(report.passed(), "{:?}", report.records());
        assert_eq!(page.value_of(GITHUB_TOKEN_FIELD).await.as_deref(), Some(""));
        let labels: Vec<_> = report.records().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Dashboard edit env page loaded",
                "GITHUB_TOKEN env is set",
                "Env saved"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_input_outside_env_form_is_left_alone() {
        let page = env_editor("#primary");
        let field = Selector::css(GITHUB_TOKEN_FIELD);
        tokio::time::sleep(Duration::from_millis(80)).await;
        page.type_into(&field, "gh-token").await.unwrap();

        let (result, _) = run_one(DashboardStep::RemoveGithubToken, &page).await;
        let err = result.unwrap_err();
        assert!(err.is_missing_element(), "{}", err);
        assert_eq!(page.value_of(GITHUB_TOKEN_FIELD).await.as_deref(), Some("gh-token"));
        let save = PageCall::Click(SAVE_ENV_BUTTON.to_string());
        assert!(!page.actions().await.contains(&save));
    }
}
