//! HTTP backend.
//!
//! The client contract is deliberately string-typed: a request returns the
//! response body, or a string starting with [`ERROR_MARKER`] when anything
//! went wrong.  Scripts branch on that prefix, so it must not change.
//!
//! Command bodies understood by [`HttpHandler`]:
//!
//! | Body | Request |
//! |------|---------|
//! | `GET <url>` | `GET` |
//! | `POST <url> <payload…>` | `POST` with the rest of the line as the body |
//!
//! Relative URLs are joined to the handler's base URL.

use std::time::Duration;

use tracing::debug;

use crate::dispatch::{ExecutionResult, Handler};
use crate::script::value::Value;

/// Prefix of every failed-request response.
pub const ERROR_MARKER: &str = "ERROR";

/// Whether a client response denotes failure.
pub fn is_error_marker(response: &str) -> bool {
    response.starts_with(ERROR_MARKER)
}

/// Blocking request/response primitive used by HTTP-speaking handlers.
pub trait HttpClient: Send {
    fn get(&self, url: &str) -> String;
    fn post(&self, url: &str, body: &str) -> String;
}

// ── UreqClient ────────────────────────────────────────────────────────────────

/// [`HttpClient`] backed by a `ureq` agent.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(timeout: Duration) -> Self {
        UreqClient {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpClient for UreqClient {
    fn get(&self, url: &str) -> String {
        read_response(self.agent.get(url).call())
    }

    fn post(&self, url: &str, body: &str) -> String {
        let content_type = if serde_json::from_str::<serde_json::Value>(body).is_ok() {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        };
        read_response(
            self.agent
                .post(url)
                .set("Content-Type", content_type)
                .send_string(body),
        )
    }
}

fn read_response(res: Result<ureq::Response, ureq::Error>) -> String {
    match res {
        Ok(resp) => resp
            .into_string()
            .unwrap_or_else(|e| format!("{ERROR_MARKER}: reading body: {e}")),
        Err(ureq::Error::Status(code, resp)) => {
            let detail = resp.into_string().unwrap_or_default();
            format!("{ERROR_MARKER}: HTTP {code}: {}", detail.trim())
        }
        Err(e) => format!("{ERROR_MARKER}: {e}"),
    }
}

// ── HttpHandler ───────────────────────────────────────────────────────────────

/// Dispatch target that performs one HTTP request per command.
pub struct HttpHandler<C: HttpClient> {
    client: C,
    base_url: Option<String>,
}

impl<C: HttpClient> HttpHandler<C> {
    pub fn new(client: C) -> Self {
        HttpHandler {
            client,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    fn resolve_url(&self, url: &str) -> Option<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Some(url.to_owned());
        }
        let base = self.base_url.as_deref()?;
        Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ))
    }
}

impl<C: HttpClient> Handler for HttpHandler<C> {
    fn dispatch(&mut self, body: &str) -> ExecutionResult {
        let mut parts = body.trim_start().splitn(3, char::is_whitespace);
        let method = parts.next().unwrap_or_default();
        let Some(url) = parts.next().filter(|u| !u.is_empty()) else {
            return ExecutionResult::fail("usage: GET <url> | POST <url> <body>");
        };
        let Some(url) = self.resolve_url(url) else {
            return ExecutionResult::fail(format!("relative URL without base: {url}"));
        };
        let payload = parts.next().unwrap_or_default();

        debug!(method, %url, "http request");
        let response = match method.to_ascii_uppercase().as_str() {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url, payload),
            other => return ExecutionResult::fail(format!("unsupported HTTP method: {other}")),
        };

        if is_error_marker(&response) {
            ExecutionResult::Failure(response)
        } else {
            ExecutionResult::Success(decode_body(response))
        }
    }
}

/// JSON bodies become structured values; anything else stays text.
fn decode_body(body: String) -> Value {
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => Value::from(json),
        Err(_) => Value::Str(body),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
