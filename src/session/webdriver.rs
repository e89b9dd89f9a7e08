//! W3C WebDriver client over HTTP
//!
//! Implements [`SessionProvider`] and [`BrowserSession`] against a remote hub
//! (basic-auth credentials, out-of-band status reporting) or a local driver
//! endpoint. Every call is a single JSON round trip bounded by the client
//! timeout.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::capabilities::{build_capabilities, new_session_body};
use super::{BrowserSession, ElementHandle, Locator, SessionProvider, SessionStatus};
use crate::config::HubConfig;
use crate::models::EnvironmentSpec;
use crate::utils::error::{ProvisioningError, SessionError};
use crate::utils::truncate_text;

/// W3C web element identifier key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Script used for clicks; works on elements covered by overlays
const CLICK_SCRIPT: &str = "arguments[0].click();";

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    access_key: String,
}

/// Creates sessions on a WebDriver endpoint
pub struct RemoteProvider {
    client: Client,
    endpoint: String,
    credentials: Option<Credentials>,
    provider_options_key: String,
    report_status: bool,
}

impl RemoteProvider {
    /// Provider for the configured hub
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::Connectivity` if the HTTP client cannot be built
    pub fn new(hub: &HubConfig) -> Result<Self, ProvisioningError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(hub.request_timeout_secs))
            .build()
            .map_err(ProvisioningError::Connectivity)?;

        let credentials = match (&hub.username, &hub.access_key) {
            (Some(username), Some(access_key)) if !username.is_empty() => Some(Credentials {
                username: username.clone(),
                access_key: access_key.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client,
            endpoint: hub.url.trim_end_matches('/').to_string(),
            credentials,
            provider_options_key: hub.provider_options_key.clone(),
            report_status: hub.report_status,
        })
    }

    /// Provider for a local driver endpoint: no credentials, no status reporting
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::Connectivity` if the HTTP client cannot be built
    pub fn local(endpoint: &str, timeout: Duration) -> Result<Self, ProvisioningError> {
        let hub = HubConfig {
            url: endpoint.to_string(),
            username: None,
            access_key: None,
            report_status: false,
            request_timeout_secs: timeout.as_secs().max(1),
            ..HubConfig::default()
        };
        Self::new(&hub)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SessionProvider for RemoteProvider {
    async fn create_session(
        &self,
        env: &EnvironmentSpec,
    ) -> Result<Box<dyn BrowserSession>, ProvisioningError> {
        let caps = build_capabilities(env, &self.provider_options_key);
        let url = format!("{}/session", self.endpoint);

        tracing::debug!(label = %env.label, endpoint = %self.endpoint, "Requesting new session");

        let mut request = self.client.post(&url).json(&new_session_body(caps));
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.access_key));
        }

        let response = request
            .send()
            .await
            .map_err(ProvisioningError::Connectivity)?;
        let status = response.status();

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ProvisioningError::Auth(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(ProvisioningError::Connectivity)?;
        let json: Value = serde_json::from_str(&body).map_err(|e| {
            ProvisioningError::Protocol(format!(
                "HTTP {}: unparseable body ({e}): {}",
                status.as_u16(),
                truncate_text(&body, 200)
            ))
        })?;

        if let Some(error) = json.pointer("/value/error").and_then(Value::as_str) {
            let message = json
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown webdriver error");
            return Err(ProvisioningError::InvalidCapability(format!(
                "{error}: {}",
                truncate_text(message, 300)
            )));
        }

        if !status.is_success() {
            return Err(ProvisioningError::Protocol(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_text(&body, 200)
            )));
        }

        let session_id = json
            .pointer("/value/sessionId")
            .or_else(|| json.pointer("/sessionId"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProvisioningError::Protocol(format!(
                    "missing sessionId: {}",
                    truncate_text(&body, 200)
                ))
            })?
            .to_string();

        tracing::info!(label = %env.label, session_id = %session_id, "Session created");

        Ok(Box::new(RemoteSession {
            client: self.client.clone(),
            base: format!("{}/session/{session_id}", self.endpoint),
            id: session_id,
            credentials: self.credentials.clone(),
            report_status: self.report_status,
        }))
    }
}

/// Live session on a WebDriver endpoint
pub struct RemoteSession {
    client: Client,
    base: String,
    id: String,
    credentials: Option<Credentials>,
    report_status: bool,
}

impl RemoteSession {
    /// Send one command and return its `value` field
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, SessionError> {
        let url = format!("{}{path}", self.base);
        let mut request = self.client.request(method, &url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.access_key));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            SessionError::Protocol(format!(
                "HTTP {}: unparseable body ({e}): {}",
                status.as_u16(),
                truncate_text(&text, 200)
            ))
        })?;

        if let Some(error) = json.pointer("/value/error").and_then(Value::as_str) {
            let message = json
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if error == "stale element reference" {
                return Err(SessionError::StaleElement(truncate_text(message, 200)));
            }
            return Err(SessionError::WebDriver {
                error: error.to_string(),
                message: truncate_text(message, 300),
            });
        }

        if !status.is_success() {
            return Err(SessionError::Protocol(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_text(&text, 200)
            )));
        }

        Ok(json.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, SessionError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    fn element_ref(element: &ElementHandle) -> Value {
        json!({ ELEMENT_KEY: element.id() })
    }
}

/// Read element handles out of a `find elements` response value
fn parse_elements(value: &Value) -> Result<Vec<ElementHandle>, SessionError> {
    let entries = value
        .as_array()
        .ok_or_else(|| SessionError::Protocol(format!("expected element array, got {value}")))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .get(ELEMENT_KEY)
                .or_else(|| entry.get("ELEMENT"))
                .and_then(Value::as_str)
                .map(|id| ElementHandle(id.to_string()))
                .ok_or_else(|| SessionError::Protocol(format!("malformed element reference {entry}")))
        })
        .collect()
}

/// Provider executor command for out-of-band session status
fn status_script(status: SessionStatus, reason: &str) -> String {
    let command = json!({
        "action": "setSessionStatus",
        "arguments": { "status": status.as_str(), "reason": reason },
    });
    format!("browserstack_executor: {command}")
}

#[async_trait]
impl BrowserSession for RemoteSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn goto(&self, url: &str) -> Result<(), SessionError> {
        tracing::debug!(session_id = %self.id, url = %url, "Navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, SessionError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": locator.using(), "value": locator.value() })),
            )
            .await
            .map_err(|e| match e {
                SessionError::WebDriver { error, .. } if error == "invalid selector" => {
                    SessionError::UnsupportedLocator(locator.to_string())
                }
                other => other,
            })?;
        parse_elements(&value)
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/displayed", element.id()),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, SessionError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.id()), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/attribute/{name}", element.id()),
                None,
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError> {
        self.execute(CLICK_SCRIPT, vec![Self::element_ref(element)])
            .await
            .map(|_| ())
    }

    async fn page_source(&self) -> Result<String, SessionError> {
        let value = self.command(Method::GET, "/source", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn set_status(&self, status: SessionStatus, reason: &str) -> Result<(), SessionError> {
        if !self.report_status {
            return Ok(());
        }
        self.execute(&status_script(status, reason), Vec::new())
            .await
            .map(|_| ())
    }

    async fn quit(&self) -> Result<(), SessionError> {
        tracing::debug!(session_id = %self.id, "Deleting session");
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}
