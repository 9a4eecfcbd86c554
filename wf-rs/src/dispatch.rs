//! Backend dispatch.
//!
//! Every command line names a target backend in its first word.  The
//! [`Dispatcher`] maps target names (case-sensitive) to [`Handler`]s and
//! forwards the rest of the line verbatim.  An unregistered target is an
//! ordinary failed result, not an error: a workflow that spans many optional
//! services keeps going when one of them is not configured.

use std::collections::{BTreeMap, HashMap};

use crate::script::value::Value;

// ── ExecutionResult ───────────────────────────────────────────────────────────

/// Outcome of one dispatched command.
///
/// Success carries a payload and failure carries error text; never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success(Value),
    Failure(String),
}

impl ExecutionResult {
    pub fn ok(payload: impl Into<Value>) -> Self {
        ExecutionResult::Success(payload.into())
    }

    pub fn fail(error: impl Into<String>) -> Self {
        ExecutionResult::Failure(error.into())
    }

    pub fn success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            ExecutionResult::Success(v) => Some(v),
            ExecutionResult::Failure(_) => None,
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success(_) => None,
            ExecutionResult::Failure(e) => Some(e),
        }
    }

    /// Scope representation: `{success, payload}` or `{success, error}`.
    pub fn to_value(&self) -> Value {
        let mut fields = BTreeMap::new();
        fields.insert("success".to_owned(), Value::Bool(self.success()));
        match self {
            ExecutionResult::Success(v) => fields.insert("payload".to_owned(), v.clone()),
            ExecutionResult::Failure(e) => fields.insert("error".to_owned(), Value::Str(e.clone())),
        };
        Value::Map(fields)
    }
}

// ── Handler ───────────────────────────────────────────────────────────────────

/// A backend that executes command bodies for one target.
///
/// Handlers own their retry policy; the dispatcher calls each one exactly
/// once per command.
pub trait Handler: Send {
    fn dispatch(&mut self, body: &str) -> ExecutionResult;
}

impl<F> Handler for F
where
    F: FnMut(&str) -> ExecutionResult + Send,
{
    fn dispatch(&mut self, body: &str) -> ExecutionResult {
        self(body)
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Target name → handler registry.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `target`.
    pub fn register(&mut self, target: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(target.into(), Box::new(handler));
    }

    /// Remove a handler.  Returns `true` if one was registered.
    pub fn unregister(&mut self, target: &str) -> bool {
        self.handlers.remove(target).is_some()
    }

    pub fn is_registered(&self, target: &str) -> bool {
        self.handlers.contains_key(target)
    }

    /// Registered target names, sorted.
    pub fn targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Send `body` to the handler registered for `target`.
    pub fn dispatch(&mut self, target: &str, body: &str) -> ExecutionResult {
        match self.handlers.get_mut(target) {
            Some(handler) => handler.dispatch(body),
            None => ExecutionResult::fail(format!("unknown target: {target}")),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("targets", &self.targets())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_target_is_a_failed_result() {
        let mut d = Dispatcher::new();
        let res = d.dispatch("UNKNOWN", "ping");
        assert!(!res.success());
        assert_eq!(res.error_text(), Some("unknown target: UNKNOWN"));
        assert_eq!(res.payload(), None);
    }

    #[test]
    fn body_is_forwarded_verbatim() {
        let mut d = Dispatcher::new();
        d.register("ECHO", |body: &str| ExecutionResult::ok(body));
        assert_eq!(
            d.dispatch("ECHO", "  spaced  body "),
            ExecutionResult::Success(Value::Str("  spaced  body ".into()))
        );
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let mut d = Dispatcher::new();
        d.register("ECHO", |body: &str| ExecutionResult::ok(body));
        assert!(d.dispatch("echo", "x").error_text().is_some());
    }

    #[test]
    fn handler_failures_pass_through() {
        let mut d = Dispatcher::new();
        d.register("DOWN", |_: &str| ExecutionResult::fail("connection refused"));
        assert_eq!(
            d.dispatch("DOWN", "x"),
            ExecutionResult::Failure("connection refused".into())
        );
    }

    #[test]
    fn stateful_handler() {
        let mut d = Dispatcher::new();
        let mut calls = 0i64;
        d.register("COUNT", move |_: &str| {
            calls += 1;
            ExecutionResult::ok(calls)
        });
        d.dispatch("COUNT", "");
        assert_eq!(d.dispatch("COUNT", ""), ExecutionResult::ok(2i64));
    }

    #[test]
    fn register_replace_and_unregister() {
        let mut d = Dispatcher::new();
        d.register("B", |_: &str| ExecutionResult::ok("one"));
        d.register("A", |_: &str| ExecutionResult::ok("a"));
        d.register("B", |_: &str| ExecutionResult::ok("two"));
        assert_eq!(d.targets(), ["A", "B"]);
        assert_eq!(d.dispatch("B", ""), ExecutionResult::ok("two"));
        assert!(d.unregister("A"));
        assert!(!d.is_registered("A"));
    }

    #[test]
    fn scope_value_shapes() {
        let ok = ExecutionResult::ok(3i64).to_value();
        assert_eq!(ok.field("success"), Some(&Value::Bool(true)));
        assert_eq!(ok.field("payload"), Some(&Value::Int(3)));
        assert_eq!(ok.field("error"), None);

        let bad = ExecutionResult::fail("boom").to_value();
        assert_eq!(bad.field("success"), Some(&Value::Bool(false)));
        assert_eq!(bad.field("error"), Some(&Value::Str("boom".into())));
        assert_eq!(bad.field("payload"), None);
    }
}
