//! WebDriver client for communicating with chromedriver / geckodriver
//!
//! Every command is a JSON request against the session's URL space. Non-2xx
//! responses carry a `{ "value": { "error", "message" } }` body which is
//! surfaced as [`Error::WebDriver`].

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::common::config::BrowserKind;
use crate::common::{join_url, Error, Result};

use super::types::*;

/// WebDriver client bound to one browser session
pub struct WebDriverClient {
    http: reqwest::Client,
    /// Endpoint of the WebDriver server (e.g. `http://localhost:9515`)
    endpoint: String,
    /// Session ID returned by `POST /session`
    session_id: String,
}

impl WebDriverClient {
    /// Query the server's readiness
    pub async fn status(endpoint: &str) -> Result<StatusResponse> {
        let http = reqwest::Client::new();
        let url = join_url(endpoint, "status");
        tracing::debug!("WebDriver >>> GET {}", url);

        let response = http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_response(status, &body)
    }

    /// Open a new browser session
    pub async fn new_session(endpoint: &str, browser: BrowserKind, headless: bool) -> Result<Self> {
        let http = reqwest::Client::new();
        let request = NewSessionRequest::for_browser(browser, headless);

        let url = join_url(endpoint, "session");
        let body = serde_json::to_value(&request)?;
        tracing::debug!("WebDriver >>> POST {} {}", url, body);

        let response = http.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let session: NewSessionResponse = decode_response(status, &text)?;

        tracing::info!(
            session_id = %session.session_id,
            browser = browser.browser_name(),
            headless,
            "WebDriver session opened"
        );

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            session_id: session.session_id,
        })
    }

    fn session_url(&self, path: &str) -> String {
        let base = format!("{}/session/{}", self.endpoint, self.session_id);
        if path.is_empty() {
            base
        } else {
            join_url(&base, path)
        }
    }

    /// Send a command and decode the `value` of its response
    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let url = self.session_url(path);
        tracing::trace!("WebDriver >>> {} {} {:?}", method, url, body);

        let mut request = self.http.request(method.clone(), &url);
        // POST commands must carry a JSON object even when they take no parameters
        if method == Method::POST {
            request = request.json(&body.unwrap_or_else(|| json!({})));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::trace!("WebDriver <<< {} {}", status, text);

        decode_response(status, &text)
    }

    /// Navigate the current browsing context
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let body = serde_json::to_value(NavigateRequest { url })?;
        self.command::<Value>(Method::POST, "url", Some(body)).await?;
        Ok(())
    }

    /// Get the current page URL
    pub async fn current_url(&self) -> Result<String> {
        self.command(Method::GET, "url", None).await
    }

    /// Find all elements matching a locator
    pub async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementRef>> {
        let body = serde_json::to_value(locator)?;
        self.command(Method::POST, "elements", Some(body)).await
    }

    /// Find the first element matching a locator
    pub async fn find_element(&self, locator: &Locator) -> Result<ElementRef> {
        self.find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(format!("{} `{}`", locator.using, locator.value)))
    }

    /// Find elements matching a locator, searching from an element
    pub async fn find_elements_from(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>> {
        let path = format!("element/{}/elements", parent.id);
        let body = serde_json::to_value(locator)?;
        self.command(Method::POST, &path, Some(body)).await
    }

    pub async fn click(&self, element: &ElementRef) -> Result<()> {
        let path = format!("element/{}/click", element.id);
        self.command::<Value>(Method::POST, &path, None).await?;
        Ok(())
    }

    pub async fn clear(&self, element: &ElementRef) -> Result<()> {
        let path = format!("element/{}/clear", element.id);
        self.command::<Value>(Method::POST, &path, None).await?;
        Ok(())
    }

    /// Type text into an element
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        let path = format!("element/{}/value", element.id);
        let body = serde_json::to_value(SendKeysRequest { text })?;
        self.command::<Value>(Method::POST, &path, Some(body)).await?;
        Ok(())
    }

    /// Rendered text of an element
    pub async fn element_text(&self, element: &ElementRef) -> Result<String> {
        let path = format!("element/{}/text", element.id);
        self.command(Method::GET, &path, None).await
    }

    /// Run a synchronous script in the page
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let body = serde_json::to_value(ExecuteRequest { script, args })?;
        self.command(Method::POST, "execute/sync", Some(body)).await
    }

    /// Close the browser session
    pub async fn delete_session(&self) -> Result<()> {
        self.command::<Value>(Method::DELETE, "", None).await?;
        tracing::info!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }
}

/// Decode a WebDriver HTTP response body
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        Error::WebDriverProtocol(format!("Invalid JSON (HTTP {}): {}", status.as_u16(), e))
    })?;

    if !status.is_success() {
        let err: WireResponse<WireError> = serde_json::from_value(value).map_err(|_| {
            Error::WebDriverProtocol(format!("HTTP {} without an error payload", status.as_u16()))
        })?;
        return Err(Error::webdriver(&err.value.error, &err.value.message));
    }

    let response: WireResponse<T> = serde_json::from_value(value)
        .map_err(|e| Error::WebDriverProtocol(format!("Failed to parse response value: {}", e)))?;
    Ok(response.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_value() {
        let url: String =
            decode_response(StatusCode::OK, r#"{"value":"http://dash.test/login"}"#).unwrap();
        assert_eq!(url, "http://dash.test/login");
    }

    #[test]
    fn test_decode_null_value_for_commands() {
        let v: Value = decode_response(StatusCode::OK, r#"{"value":null}"#).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_decode_elements() {
        let body = format!(
            r#"{{"value":[{{"{}":"e1"}},{{"{}":"e2"}}]}}"#,
            ELEMENT_KEY, ELEMENT_KEY
        );
        let els: Vec<ElementRef> = decode_response(StatusCode::OK, &body).unwrap();
        assert_eq!(els.len(), 2);
        assert_eq!(els[1].id, "e2");
    }

    #[test]
    fn test_decode_error_payload() {
        let body =
            r#"{"value":{"error":"no such element","message":"Unable to locate","stacktrace":""}}"#;
        let err = decode_response::<Value>(StatusCode::NOT_FOUND, body).unwrap_err();
        match err {
            Error::WebDriver { error, message } => {
                assert_eq!(error, "no such element");
                assert_eq!(message, "Unable to locate");
            }
            other => panic!("Expected WebDriver error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_is_protocol_error() {
        let err = decode_response::<Value>(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, Error::WebDriverProtocol(_)));
    }

    #[test]
    fn test_decode_session() {
        let body = r#"{"value":{"sessionId":"s-1","capabilities":{"browserName":"chrome"}}}"#;
        let session: NewSessionResponse = decode_response(StatusCode::OK, body).unwrap();
        assert_eq!(session.session_id, "s-1");
        assert_eq!(session.capabilities["browserName"], "chrome");
    }
}
