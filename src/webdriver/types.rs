//! WebDriver message types
//!
//! These types represent the W3C WebDriver wire protocol messages.
//! See: https://www.w3.org/TR/webdriver2/

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::common::config::BrowserKind;

/// Key under which a web element reference is serialized
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

// === Envelopes ===

/// Every WebDriver response wraps its payload in `value`
#[derive(Debug, Deserialize)]
pub struct WireResponse<T> {
    pub value: T,
}

/// Error payload returned with a non-2xx status
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub stacktrace: Option<String>,
}

// === Session ===

/// New session request
#[derive(Debug, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: CapabilitiesRequest,
}

/// Capability matching block
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequest {
    pub always_match: Value,
}

/// New session response payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub capabilities: Value,
}

/// `GET /status` payload
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub ready: bool,
    #[serde(default)]
    pub message: String,
}

impl NewSessionRequest {
    /// Build the capabilities for a browser, optionally headless
    pub fn for_browser(browser: BrowserKind, headless: bool) -> Self {
        let always_match = match browser {
            BrowserKind::Chrome => {
                let mut args = vec!["--no-sandbox", "--disable-gpu", "--window-size=1280,800"];
                if headless {
                    args.push("--headless=new");
                }
                json!({
                    "browserName": browser.browser_name(),
                    "goog:chromeOptions": { "args": args }
                })
            }
            BrowserKind::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { Vec::new() };
                json!({
                    "browserName": browser.browser_name(),
                    "moz:firefoxOptions": { "args": args }
                })
            }
        };

        Self {
            capabilities: CapabilitiesRequest { always_match },
        }
    }
}

// === Elements ===

/// Opaque reference to an element in the current browsing context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    pub id: String,
}

impl ElementRef {
    /// JSON form used when passing the element as a script argument
    pub fn to_arg(&self) -> Value {
        json!({ ELEMENT_KEY: self.id })
    }
}

/// Element location strategy and value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locator {
    pub using: &'static str,
    pub value: String,
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            using: "css selector",
            value: value.into(),
        }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            using: "xpath",
            value: value.into(),
        }
    }
}

// === Command bodies ===

#[derive(Debug, Serialize)]
pub struct NavigateRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SendKeysRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExecuteRequest<'a> {
    pub script: &'a str,
    pub args: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref_wire_format() {
        let el: ElementRef =
            serde_json::from_value(json!({ ELEMENT_KEY: "abc-123" })).unwrap();
        assert_eq!(el.id, "abc-123");
        assert_eq!(el.to_arg(), json!({ ELEMENT_KEY: "abc-123" }));
    }

    #[test]
    fn test_headless_chrome_capabilities() {
        let req = NewSessionRequest::for_browser(BrowserKind::Chrome, true);
        let body = serde_json::to_value(&req).unwrap();
        let caps = &body["capabilities"]["alwaysMatch"];
        assert_eq!(caps["browserName"], "chrome");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn test_headed_firefox_capabilities() {
        let req = NewSessionRequest::for_browser(BrowserKind::Firefox, false);
        let body = serde_json::to_value(&req).unwrap();
        let caps = &body["capabilities"]["alwaysMatch"];
        assert_eq!(caps["browserName"], "firefox");
        assert!(caps["moz:firefoxOptions"]["args"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_locator_serialization() {
        let body = serde_json::to_value(Locator::xpath("//input[@type=\"password\"]")).unwrap();
        assert_eq!(body, json!({ "using": "xpath", "value": "//input[@type=\"password\"]" }));
    }
}
