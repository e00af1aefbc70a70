//! [`Page`] backed by a live WebDriver session

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::webdriver::{ElementRef, Locator, WebDriverClient};

use super::{Page, Selector};

/// Submits a form the way a user pressing Enter would, firing submit handlers
const SUBMIT_SCRIPT: &str = "const form = arguments[0];\
     if (typeof form.requestSubmit === 'function') { form.requestSubmit(); }\
     else { form.submit(); }";

/// A page driven through WebDriver
pub struct DriverPage {
    client: WebDriverClient,
}

impl DriverPage {
    pub fn new(client: WebDriverClient) -> Self {
        Self { client }
    }

    /// End the browser session
    pub async fn close(self) -> Result<()> {
        self.client.delete_session().await
    }

    async fn first(&self, selector: &Selector) -> Result<ElementRef> {
        self.client.find_element(&locator(selector)).await
    }

    /// Resolve a field among the descendants of its form
    async fn field(
        &self,
        form: &Selector,
        form_el: &ElementRef,
        selector: &Selector,
    ) -> Result<ElementRef> {
        self.client
            .find_elements_from(form_el, &locator(selector))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(format!("{} inside {}", selector, form)))
    }
}

fn locator(selector: &Selector) -> Locator {
    match selector {
        Selector::Css(s) => Locator::css(s.as_str()),
        Selector::XPath(s) => Locator::xpath(s.as_str()),
    }
}

#[async_trait]
impl Page for DriverPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "navigate");
        self.client.navigate(url).await
    }

    async fn current_url(&self) -> Result<String> {
        self.client.current_url().await
    }

    async fn exists(&self, selector: &Selector) -> Result<bool> {
        let found = self.client.find_elements(&locator(selector)).await?;
        Ok(!found.is_empty())
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        tracing::debug!(%selector, "click");
        let el = self.first(selector).await?;
        self.client.click(&el).await
    }

    async fn fill_form(
        &self,
        form: &Selector,
        fields: &[(Selector, String)],
        submit: bool,
    ) -> Result<()> {
        tracing::debug!(%form, fields = fields.len(), submit, "fill form");
        let form_el = self.first(form).await?;

        for (selector, value) in fields {
            let el = self.field(form, &form_el, selector).await?;
            self.client.clear(&el).await?;
            if !value.is_empty() {
                self.client.send_keys(&el, value).await?;
            }
        }

        if submit {
            self.client
                .execute(SUBMIT_SCRIPT, vec![form_el.to_arg()])
                .await
                .map_err(|e| match e {
                    Error::WebDriver { error, message } => Error::WebDriver {
                        error,
                        message: format!("submitting {}: {}", form, message),
                    },
                    other => other,
                })?;
        }
        Ok(())
    }

    async fn type_into(&self, selector: &Selector, text: &str) -> Result<()> {
        tracing::debug!(%selector, "type");
        let el = self.first(selector).await?;
        self.client.send_keys(&el, text).await
    }

    async fn text(&self, selector: &Selector) -> Result<String> {
        let el = self.first(selector).await?;
        self.client.element_text(&el).await
    }
}
