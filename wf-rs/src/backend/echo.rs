//! Local stand-in backends.

use crate::dispatch::{ExecutionResult, Handler};
use crate::script::value::Value;

/// Succeeds with the command body as payload.  Useful for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn dispatch(&mut self, body: &str) -> ExecutionResult {
        ExecutionResult::ok(body)
    }
}

/// Answers every command with the same payload, e.g. canned query rows.
#[derive(Debug, Clone)]
pub struct FixtureHandler {
    payload: Value,
}

impl FixtureHandler {
    pub fn new(payload: impl Into<Value>) -> Self {
        FixtureHandler {
            payload: payload.into(),
        }
    }

    /// Build from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Self::new(json))
    }
}

impl Handler for FixtureHandler {
    fn dispatch(&mut self, _body: &str) -> ExecutionResult {
        ExecutionResult::Success(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_returns_body() {
        assert_eq!(EchoHandler.dispatch("hi there"), ExecutionResult::ok("hi there"));
    }

    #[test]
    fn fixture_from_json() {
        let mut h = FixtureHandler::from_json(r#"[{"sku": "A"}]"#).unwrap();
        let res = h.dispatch("select * from orders");
        let first = res.payload().and_then(|p| p.field("0")).and_then(|r| r.field("sku"));
        assert_eq!(first, Some(&Value::Str("A".into())));
        assert!(FixtureHandler::from_json("{not json").is_err());
    }
}
