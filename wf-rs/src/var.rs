//! Workflow variable scope.
//!
//! One [`Scope`] lives for the duration of a run.  Synthesized sub-runs
//! borrow the same instance, so bindings made inside them stay visible to
//! the rest of the parent script.

use std::collections::HashMap;

use crate::script::value::Value;

/// Name → value bindings for one workflow run.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Resolve a dotted path such as `orders.payload.rows.0.sku`.
    ///
    /// The first segment names a variable; later segments index into maps
    /// by key and into lists by position.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        segments.try_fold(self.vars.get(head)?, |v, seg| v.field(seg))
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Sorted `name=value` lines, used in error reports.
    pub fn snapshot(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect();
        lines.sort();
        lines
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_get() {
        let mut scope = Scope::new();
        scope.set("region", "eu-west");
        assert_eq!(scope.get("region"), Some(&Value::Str("eu-west".into())));
    }

    #[test]
    fn overwrite() {
        let mut scope = Scope::new();
        scope.set("x", 1i64);
        scope.set("x", 2i64);
        assert_eq!(scope.get("x"), Some(&Value::Int(2)));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn resolve_nested_path() {
        let mut scope = Scope::new();
        scope.set("orders", Value::from(json!({"payload": {"rows": [{"sku": "A"}]}})));
        assert_eq!(
            scope.resolve("orders.payload.rows.0.sku"),
            Some(&Value::Str("A".into()))
        );
        assert_eq!(scope.resolve("orders.payload.rows.5"), None);
        assert_eq!(scope.resolve("missing.field"), None);
    }

    #[test]
    fn unset() {
        let mut scope = Scope::new();
        scope.set("gone", "bye");
        assert!(scope.unset("gone"));
        assert!(!scope.unset("gone"));
        assert!(!scope.contains("gone"));
    }

    #[test]
    fn snapshot_is_sorted() {
        let mut scope = Scope::new();
        scope.set("b", 2i64);
        scope.set("a", 1i64);
        assert_eq!(scope.snapshot(), ["a=1", "b=2"]);
    }
}
