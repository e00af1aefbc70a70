//! Scripted in-memory page
//!
//! `FakePage` stands in for a browser when exercising the scenario. It holds a
//! URL and a set of elements keyed by their exact selector text. Form fields
//! are registered under the form that contains them, and `fill_form` only
//! finds fields registered under the form it is given. Changes to
//! that state are scripted up front: at a point on the tokio clock, or as the
//! reaction to a click or a form submission, optionally delayed. Time-driven
//! changes are applied lazily whenever the page is next touched, which makes
//! the fake work unchanged under a paused tokio clock.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::common::{Error, Result};

use super::{Page, Selector};

/// A change to the fake page's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The page now shows this URL
    SetUrl(String),
    /// An element starts matching `selector`
    Show { selector: String, text: String },
    /// A field matching `selector` appears inside the element matching `form`
    ShowIn { form: String, selector: String },
    /// No element matches `selector` any more
    Hide(String),
    /// The element matching `selector` renders different text
    SetText { selector: String, text: String },
}

impl Change {
    pub fn url(url: impl Into<String>) -> Self {
        Self::SetUrl(url.into())
    }

    pub fn show(selector: impl Into<String>) -> Self {
        Self::Show {
            selector: selector.into(),
            text: String::new(),
        }
    }

    pub fn show_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Show {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn show_in(form: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::ShowIn {
            form: form.into(),
            selector: selector.into(),
        }
    }

    pub fn hide(selector: impl Into<String>) -> Self {
        Self::Hide(selector.into())
    }

    pub fn set_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::SetText {
            selector: selector.into(),
            text: text.into(),
        }
    }
}

/// A capability call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCall {
    Navigate(String),
    CurrentUrl,
    Exists(String),
    Click(String),
    FillForm {
        form: String,
        fields: Vec<(String, String)>,
        submit: bool,
    },
    TypeInto { selector: String, text: String },
    Text(String),
}

impl PageCall {
    /// Whether the call changes page state (as opposed to only reading it)
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            Self::Navigate(_) | Self::Click(_) | Self::FillForm { .. } | Self::TypeInto { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct Reaction {
    delay: Duration,
    change: Change,
    /// Fires on one trigger only; one-shot reactions fire in registration order
    once: bool,
}

/// Reactions a trigger on `key` fires, consuming the next one-shot reaction
fn fire(map: &mut HashMap<String, Vec<Reaction>>, key: &str) -> Vec<Reaction> {
    let Some(list) = map.get_mut(key) else {
        return Vec::new();
    };
    let mut fired: Vec<Reaction> = list.iter().filter(|r| !r.once).cloned().collect();
    if let Some(pos) = list.iter().position(|r| r.once) {
        fired.push(list.remove(pos));
    }
    fired
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    /// selector -> rendered text
    elements: HashMap<String, String>,
    /// form selector -> field selectors inside it
    fields: HashMap<String, HashSet<String>>,
    /// selector -> current input value
    values: HashMap<String, String>,
    /// Pending timed changes, applied in deadline order
    scheduled: Vec<(Instant, Change)>,
    on_click: HashMap<String, Vec<Reaction>>,
    on_submit: HashMap<String, Vec<Reaction>>,
    /// Reactions to navigating to a URL
    on_navigate: HashMap<String, Vec<Reaction>>,
    calls: Vec<PageCall>,
}

impl FakeState {
    fn apply_due(&mut self) {
        let now = Instant::now();
        self.scheduled.sort_by_key(|(at, _)| *at);
        let due = self.scheduled.iter().take_while(|(at, _)| *at <= now).count();
        let changes: Vec<Change> = self.scheduled.drain(..due).map(|(_, c)| c).collect();
        for change in changes {
            self.apply(change);
        }
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::SetUrl(url) => self.url = url,
            Change::Show { selector, text } => {
                self.elements.insert(selector, text);
            }
            Change::ShowIn { form, selector } => {
                self.elements.entry(selector.clone()).or_default();
                self.fields.entry(form).or_default().insert(selector);
            }
            Change::Hide(selector) => {
                self.elements.remove(&selector);
            }
            Change::SetText { selector, text } => {
                self.elements.insert(selector, text);
            }
        }
    }

    fn react(&mut self, reactions: Vec<Reaction>) {
        let now = Instant::now();
        for reaction in reactions {
            if reaction.delay.is_zero() {
                self.apply(reaction.change);
            } else {
                self.scheduled.push((now + reaction.delay, reaction.change));
            }
        }
    }

    fn require(&self, selector: &Selector) -> Result<()> {
        if self.elements.contains_key(selector.as_str()) {
            Ok(())
        } else {
            Err(Error::ElementNotFound(selector.to_string()))
        }
    }

    fn require_field(&self, form: &Selector, field: &Selector) -> Result<()> {
        let inside = self
            .fields
            .get(form.as_str())
            .is_some_and(|f| f.contains(field.as_str()));
        if inside && self.elements.contains_key(field.as_str()) {
            Ok(())
        } else {
            Err(Error::ElementNotFound(format!("{} inside {}", field, form)))
        }
    }
}

/// In-memory [`Page`] with scripted transitions
#[derive(Debug)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    /// A page currently showing `url` with no elements
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: url.into(),
                ..Default::default()
            }),
        }
    }

    /// Add an element with the given rendered text
    pub fn with_element(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .elements
            .insert(selector.into(), text.into());
        self
    }

    /// Add an empty field inside the element matching `form`
    pub fn with_field(mut self, form: impl Into<String>, selector: impl Into<String>) -> Self {
        self.state.get_mut().apply(Change::show_in(form, selector));
        self
    }

    /// Apply `change` once `after` has elapsed on the tokio clock
    pub fn schedule(mut self, after: Duration, change: Change) -> Self {
        let at = Instant::now() + after;
        self.state.get_mut().scheduled.push((at, change));
        self
    }

    /// Apply `change` when `selector` is clicked
    pub fn on_click(self, selector: impl Into<String>, change: Change) -> Self {
        self.on_click_after(selector, Duration::ZERO, change)
    }

    /// Apply `change` `delay` after `selector` is clicked
    pub fn on_click_after(
        mut self,
        selector: impl Into<String>,
        delay: Duration,
        change: Change,
    ) -> Self {
        self.state
            .get_mut()
            .on_click
            .entry(selector.into())
            .or_default()
            .push(Reaction {
                delay,
                change,
                once: false,
            });
        self
    }

    /// Apply `change` `delay` after the form matching `form` is submitted
    pub fn on_submit_after(self, form: impl Into<String>, delay: Duration, change: Change) -> Self {
        self.push_submit(form.into(), delay, change, false)
    }

    /// Apply `change` `delay` after the next submission of `form` only
    ///
    /// Several one-shot reactions on the same form fire on successive
    /// submissions, in the order they were added.
    pub fn on_submit_once(self, form: impl Into<String>, delay: Duration, change: Change) -> Self {
        self.push_submit(form.into(), delay, change, true)
    }

    fn push_submit(mut self, form: String, delay: Duration, change: Change, once: bool) -> Self {
        self.state
            .get_mut()
            .on_submit
            .entry(form)
            .or_default()
            .push(Reaction {
                delay,
                change,
                once,
            });
        self
    }

    /// Apply `change` when the page navigates to exactly `url`
    pub fn on_navigate(mut self, url: impl Into<String>, change: Change) -> Self {
        self.state
            .get_mut()
            .on_navigate
            .entry(url.into())
            .or_default()
            .push(Reaction {
                delay: Duration::ZERO,
                change,
                once: false,
            });
        self
    }

    /// Every capability call so far, in order
    pub async fn calls(&self) -> Vec<PageCall> {
        self.state.lock().await.calls.clone()
    }

    /// Only the calls that act on the page
    pub async fn actions(&self) -> Vec<PageCall> {
        self.calls()
            .await
            .into_iter()
            .filter(PageCall::is_action)
            .collect()
    }

    /// Current value typed or filled into `selector`
    pub async fn value_of(&self, selector: &str) -> Option<String> {
        self.state.lock().await.values.get(selector).cloned()
    }

    /// URL shown right now, without recording a call
    pub async fn url(&self) -> String {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.url.clone()
    }
}

#[async_trait]
impl Page for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::Navigate(url.to_string()));
        state.url = url.to_string();
        let reactions = fire(&mut state.on_navigate, url);
        state.react(reactions);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::CurrentUrl);
        Ok(state.url.clone())
    }

    async fn exists(&self, selector: &Selector) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::Exists(selector.as_str().to_string()));
        Ok(state.elements.contains_key(selector.as_str()))
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::Click(selector.as_str().to_string()));
        state.require(selector)?;
        let reactions = fire(&mut state.on_click, selector.as_str());
        state.react(reactions);
        Ok(())
    }

    async fn fill_form(
        &self,
        form: &Selector,
        fields: &[(Selector, String)],
        submit: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::FillForm {
            form: form.as_str().to_string(),
            fields: fields
                .iter()
                .map(|(s, v)| (s.as_str().to_string(), v.clone()))
                .collect(),
            submit,
        });
        state.require(form)?;
        for (selector, _) in fields {
            state.require_field(form, selector)?;
        }
        for (selector, value) in fields {
            state
                .values
                .insert(selector.as_str().to_string(), value.clone());
        }
        if submit {
            let reactions = fire(&mut state.on_submit, form.as_str());
            state.react(reactions);
        }
        Ok(())
    }

    async fn type_into(&self, selector: &Selector, text: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::TypeInto {
            selector: selector.as_str().to_string(),
            text: text.to_string(),
        });
        state.require(selector)?;
        state
            .values
            .entry(selector.as_str().to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn text(&self, selector: &Selector) -> Result<String> {
        let mut state = self.state.lock().await;
        state.apply_due();
        state.calls.push(PageCall::Text(selector.as_str().to_string()));
        state
            .elements
            .get(selector.as_str())
            .cloned()
            .ok_or_else(|| Error::ElementNotFound(selector.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_change_applies_on_time() {
        let page = FakePage::new("http://dash.test/login")
            .schedule(Duration::from_secs(2), Change::url("http://dash.test/apps"));

        assert_eq!(page.current_url().await.unwrap(), "http://dash.test/login");
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(page.current_url().await.unwrap(), "http://dash.test/login");
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(page.current_url().await.unwrap(), "http://dash.test/apps");
    }

    #[tokio::test]
    async fn test_click_missing_element_fails() {
        let page = FakePage::new("http://dash.test/");
        let err = page.click(&Selector::css(".nope")).await.unwrap_err();
        assert!(err.is_missing_element());
        // The attempt is still recorded
        assert_eq!(page.actions().await, vec![PageCall::Click(".nope".into())]);
    }

    #[tokio::test]
    async fn test_click_reaction_shows_checked_state() {
        let page = FakePage::new("http://dash.test/")
            .with_element("input[type=checkbox]", "")
            .on_click("input[type=checkbox]", Change::show("input[type=checkbox]:checked"));

        let checked = Selector::css("input[type=checkbox]:checked");
        assert!(!page.exists(&checked).await.unwrap());
        page.click(&Selector::css("input[type=checkbox]")).await.unwrap();
        assert!(page.exists(&checked).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_submit_reaction() {
        let page = FakePage::new("http://dash.test/login")
            .with_element("form", "")
            .with_field("form", "//input[@type=\"password\"]")
            .on_submit_after("form", Duration::from_millis(100), Change::url("http://dash.test/"));

        page.fill_form(
            &Selector::css("form"),
            &[(Selector::xpath("//input[@type=\"password\"]"), "abc123".to_string())],
            true,
        )
        .await
        .unwrap();

        assert_eq!(page.url().await, "http://dash.test/login");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(page.url().await, "http://dash.test/");
        assert_eq!(
            page.value_of("//input[@type=\"password\"]").await.as_deref(),
            Some("abc123")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_submits_fire_in_order() {
        let page = FakePage::new("http://dash.test/login")
            .with_element("form", "")
            .on_submit_once("form", Duration::ZERO, Change::url("http://dash.test/"))
            .on_submit_once("form", Duration::ZERO, Change::url("http://dash.test/github"));
        let form = Selector::css("form");

        page.fill_form(&form, &[], true).await.unwrap();
        assert_eq!(page.url().await, "http://dash.test/");
        page.fill_form(&form, &[], true).await.unwrap();
        assert_eq!(page.url().await, "http://dash.test/github");
        page.fill_form(&form, &[], true).await.unwrap();
        assert_eq!(page.url().await, "http://dash.test/github");
    }

    #[tokio::test]
    async fn test_type_into_appends() {
        let page = FakePage::new("about:blank").with_element("input", "");
        let sel = Selector::css("input");
        page.type_into(&sel, "TEST_").await.unwrap();
        page.type_into(&sel, "42").await.unwrap();
        assert_eq!(page.value_of("input").await.as_deref(), Some("TEST_42"));
    }

    #[tokio::test]
    async fn test_fill_replaces_and_clears() {
        let page = FakePage::new("about:blank")
            .with_element("#secondary", "")
            .with_field("#secondary", "input[value=GITHUB_TOKEN]");
        let field = Selector::css("input[value=GITHUB_TOKEN]");

        page.type_into(&field, "old").await.unwrap();
        let form = Selector::css("#secondary");
        page.fill_form(&form, &[(field, String::new())], false).await.unwrap();
        assert_eq!(page.value_of("input[value=GITHUB_TOKEN]").await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_fill_ignores_field_outside_form() {
        let page = FakePage::new("about:blank")
            .with_element("#secondary", "")
            .with_element("#primary", "")
            .with_field("#primary", "input[value=GITHUB_TOKEN]");
        let field = Selector::css("input[value=GITHUB_TOKEN]");
        page.type_into(&field, "keep").await.unwrap();

        let form = Selector::css("#secondary");
        let cleared = [(field, String::new())];
        let err = page.fill_form(&form, &cleared, false).await.unwrap_err();
        assert!(err.is_missing_element());
        assert!(err.to_string().contains("inside css `#secondary`"));
        assert_eq!(page.value_of("input[value=GITHUB_TOKEN]").await.as_deref(), Some("keep"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_field_shown_inside_form_can_be_filled() {
        let page = FakePage::new("about:blank")
            .with_element("form", "")
            .schedule(Duration::from_millis(10), Change::show_in("form", "input"));
        let fields = [(Selector::css("input"), "x".to_string())];

        assert!(page.fill_form(&Selector::css("form"), &fields, false).await.is_err());
        tokio::time::sleep(Duration::from_millis(10)).await;
        page.fill_form(&Selector::css("form"), &fields, false).await.unwrap();
        assert_eq!(page.value_of("input").await.as_deref(), Some("x"));
    }
}
