//! Workflow runner.
//!
//! The [`Runner`] walks a token stream strictly in order:
//!
//! - comments go to the observer, blanks are ignored;
//! - `CONDITION:` replaces the active condition and is evaluated at once;
//! - a command runs only while the active condition holds; its result is
//!   counted, bound to `lastResult`, and routed to a named binding when the
//!   body is a recognised query;
//! - `FOREACH:` expands a template over result rows and runs the batch as a
//!   nested pass that shares scope and statistics.
//!
//! Condition errors abort the run.  Failed dispatches do not: they are
//! recorded and scanning continues.
//!
//! ```
//! use wf::dispatch::{Dispatcher, ExecutionResult};
//! use wf::runner::Runner;
//!
//! let mut d = Dispatcher::new();
//! d.register("FOO", |b: &str| ExecutionResult::ok(b));
//! let mut runner = Runner::new(d);
//! runner.scope_mut().set("x", 1i64);
//! runner.run("CONDITION: x = 1\nFOO bar\nCONDITION: x = 2\nFOO baz").unwrap();
//! assert_eq!(runner.stats().count("FOO"), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatcher, ExecutionResult};
use crate::observer::Observer;
use crate::route::{ResultRouter, LAST_RESULT};
use crate::script::expr::{Condition, EvaluationError};
use crate::script::synth::{rows_of, synthesize, DEFAULT_MAX_ROWS};
use crate::script::token::{tokenize, Token, TokenKind};
use crate::script::value::Value;
use crate::stats::Stats;
use crate::var::Scope;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a run stopped early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("line {line}: cannot evaluate `{expression}`: {source}")]
    Evaluation {
        expression: String,
        line: usize,
        /// `name=value` bindings at the time of failure.
        scope: Vec<String>,
        #[source]
        source: EvaluationError,
    },
    #[error("cancelled before line {line}")]
    Cancelled { line: usize },
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    Evaluation {
        expression: String,
        line: usize,
        message: String,
    },
    Cancelled {
        line: usize,
    },
}

impl From<&RunError> for AbortReason {
    fn from(err: &RunError) -> Self {
        match err {
            RunError::Evaluation {
                expression,
                line,
                source,
                ..
            } => AbortReason::Evaluation {
                expression: expression.clone(),
                line: *line,
                message: source.to_string(),
            },
            RunError::Cancelled { line } => AbortReason::Cancelled { line: *line },
        }
    }
}

/// Runner lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Scanning,
    Completed,
    Aborted(AbortReason),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Scanning => write!(f, "scanning"),
            RunState::Completed => write!(f, "completed"),
            RunState::Aborted(AbortReason::Cancelled { line }) => {
                write!(f, "aborted: cancelled before line {line}")
            }
            RunState::Aborted(AbortReason::Evaluation {
                expression,
                line,
                message,
            }) => write!(f, "aborted: line {line}: `{expression}`: {message}"),
        }
    }
}

// ── Cancellation ──────────────────────────────────────────────────────────────

/// Cooperative cancellation flag, checked between tokens.
///
/// Cancellation is sticky: every later run on a runner holding this token
/// aborts at its first line until [`CancelToken::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the runner can be used again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

/// End-of-run report.  Available in every state, including after an abort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub state: RunState,
    /// Commands dispatched.
    pub attempted: u64,
    /// Dispatched commands whose result was a failure.
    pub failures: u64,
    /// Commands not dispatched because their condition was false.
    pub skipped: u64,
    pub per_target: BTreeMap<String, u64>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "state:     {}", self.state)?;
        writeln!(
            f,
            "commands:  {} attempted, {} failed, {} skipped",
            self.attempted, self.failures, self.skipped
        )?;
        for (target, n) in &self.per_target {
            writeln!(f, "  {target:<16} {n}")?;
        }
        Ok(())
    }
}

// ── Runner ────────────────────────────────────────────────────────────────────

/// Whether a token stream came from the script or from synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Script,
    Synthesized,
}

/// Executes workflow scripts against a [`Dispatcher`].
///
/// A runner owns its scope and statistics; give each concurrent run its own
/// runner.  Calling [`Runner::run`] again continues with the same scope and
/// statistics, starting from an unconditional state.  A cancelled runner
/// stays cancelled until its [`CancelToken`] is reset.
pub struct Runner {
    dispatcher: Dispatcher,
    scope: Scope,
    stats: Stats,
    router: ResultRouter,
    max_rows: usize,
    state: RunState,
    cancel: CancelToken,
    observer: Option<Box<dyn Observer>>,
    failures: u64,
    skipped: u64,
}

impl Runner {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Runner {
            dispatcher,
            scope: Scope::new(),
            stats: Stats::new(),
            router: ResultRouter::default(),
            max_rows: DEFAULT_MAX_ROWS,
            state: RunState::Idle,
            cancel: CancelToken::new(),
            observer: None,
            failures: 0,
            skipped: 0,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_router(mut self, router: ResultRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this runner at the next token boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            state: self.state.clone(),
            attempted: self.stats.total(),
            failures: self.failures,
            skipped: self.skipped,
            per_target: self.stats.summary(),
        }
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Tokenize and execute a script.
    pub fn run(&mut self, src: &str) -> Result<(), RunError> {
        let tokens = tokenize(src);
        info!(lines = tokens.len(), "run started");
        self.state = RunState::Scanning;
        let res = self.scan(&tokens, Pass::Script);
        self.finish(res)
    }

    /// Synthesize one command per row and execute them as a single batch.
    pub fn run_synthesized(&mut self, template: &str, rows: &[Value]) -> Result<(), RunError> {
        self.state = RunState::Scanning;
        let res = self.run_batch(template, rows, 0);
        self.finish(res)
    }

    fn finish(&mut self, res: Result<(), RunError>) -> Result<(), RunError> {
        self.state = match &res {
            Ok(()) => RunState::Completed,
            Err(e) => RunState::Aborted(AbortReason::from(e)),
        };
        info!(
            state = %self.state,
            attempted = self.stats.total(),
            failures = self.failures,
            skipped = self.skipped,
            "run finished"
        );
        res
    }

    // ── Scanning ──────────────────────────────────────────────────────────────

    fn scan(&mut self, tokens: &[Token], pass: Pass) -> Result<(), RunError> {
        // `None` is the unconditional state.
        let mut active: Option<Condition> = None;

        for tok in tokens {
            if self.cancel.is_cancelled() {
                warn!(line = tok.line, "run cancelled");
                return Err(RunError::Cancelled { line: tok.line });
            }
            debug!(line = tok.line, kind = ?tok.kind, "token");

            match &tok.kind {
                TokenKind::Blank => {}

                TokenKind::Comment => {
                    if let (Some(obs), Some(text)) = (self.observer.as_mut(), tok.comment_text()) {
                        obs.on_comment(text);
                    }
                }

                TokenKind::Condition { expression } => {
                    let cond = Condition::parse(expression)
                        .map_err(|e| self.evaluation_error(expression, tok.line, e))?;
                    let verdict = self.check(&cond, tok.line)?;
                    debug!(line = tok.line, %expression, verdict, "condition");
                    self.progress(format!("CONDITION {expression} -> {verdict}"));
                    active = Some(cond);
                }

                TokenKind::Command { target, body } => {
                    if !self.gate(active.as_ref(), tok.line)? {
                        self.skipped += 1;
                        self.progress(format!("{} -> skipped", tok.raw.trim()));
                        continue;
                    }
                    self.execute(target, body);
                }

                TokenKind::ForEach { source, template } => {
                    if !self.gate(active.as_ref(), tok.line)? {
                        self.progress(format!("FOREACH {source} -> skipped"));
                        continue;
                    }
                    if pass == Pass::Synthesized {
                        warn!(line = tok.line, "FOREACH inside a synthesized batch ignored");
                        continue;
                    }
                    let rows = self.rows_for(source, tok.line)?;
                    self.run_batch(template, &rows, tok.line)?;
                }
            }
        }
        Ok(())
    }

    fn gate(&self, active: Option<&Condition>, line: usize) -> Result<bool, RunError> {
        match active {
            None => Ok(true),
            Some(cond) => self.check(cond, line),
        }
    }

    fn check(&self, cond: &Condition, line: usize) -> Result<bool, RunError> {
        cond.holds(&self.scope)
            .map_err(|e| self.evaluation_error(&cond.source, line, e))
    }

    fn evaluation_error(&self, expression: &str, line: usize, source: EvaluationError) -> RunError {
        warn!(line, %expression, error = %source, "condition failed to evaluate");
        RunError::Evaluation {
            expression: expression.to_owned(),
            line,
            scope: self.scope.snapshot(),
            source,
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    fn execute(&mut self, target: &str, body: &str) {
        let result = self.dispatcher.dispatch(target, body);
        self.stats.record(target);

        match &result {
            ExecutionResult::Success(_) => {
                info!(%target, "dispatched");
                self.progress(format!("{target} {} -> ok", body.trim()));
            }
            ExecutionResult::Failure(err) => {
                self.failures += 1;
                warn!(%target, error = %err, "dispatch failed");
                self.progress(format!("{target} {} -> failed: {err}", body.trim()));
            }
        }

        let value = result.to_value();
        if let Some(name) = self.router.route(body) {
            debug!(%target, binding = name, "result routed");
            self.scope.set(name, value.clone());
        }
        self.scope.set(LAST_RESULT, value);
    }

    // ── Synthesis ─────────────────────────────────────────────────────────────

    fn rows_for(&self, source: &str, line: usize) -> Result<Vec<Value>, RunError> {
        let Some(value) = self.scope.resolve(source) else {
            return Err(self.evaluation_error(
                source,
                line,
                EvaluationError::Unbound(source.to_owned()),
            ));
        };
        match rows_of(value) {
            Some(rows) => Ok(rows.to_vec()),
            None => {
                warn!(line, %source, kind = value.type_name(), "FOREACH source has no rows");
                Ok(Vec::new())
            }
        }
    }

    /// Run one synthesized batch.  Every synthesized token reports `line`,
    /// the line of the directive that produced it.
    fn run_batch(&mut self, template: &str, rows: &[Value], line: usize) -> Result<(), RunError> {
        let commands = synthesize(template, rows, self.max_rows);
        info!(line, commands = commands.len(), "synthesized batch");
        self.progress(format!("FOREACH -> {} commands", commands.len()));

        let mut batch = tokenize(&commands.join("\n"));
        for tok in &mut batch {
            tok.line = line;
        }
        self.scan(&batch, Pass::Synthesized)
    }

    fn progress(&mut self, line: String) {
        if let Some(obs) = self.observer.as_mut() {
            obs.on_progress(&line);
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("dispatcher", &self.dispatcher)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Transcript;
    use serde_json::json;
    use std::sync::Mutex;

    /// Dispatcher whose handlers log `TARGET body` into a shared list.
    fn recording(targets: &[&str]) -> (Dispatcher, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut d = Dispatcher::new();
        for &t in targets {
            let log = Arc::clone(&log);
            let name = t.to_owned();
            d.register(t, move |body: &str| {
                log.lock().unwrap().push(format!("{name} {body}"));
                ExecutionResult::ok(body)
            });
        }
        (d, log)
    }

    #[test]
    fn unconditional_commands_run_in_order() {
        let (d, log) = recording(&["A", "B"]);
        let mut r = Runner::new(d);
        r.run("A one\n# note\n\nB two\nA three").unwrap();
        assert_eq!(*log.lock().unwrap(), ["A one", "B two", "A three"]);
        assert_eq!(r.stats().count("A"), 2);
        assert_eq!(*r.state(), RunState::Completed);
    }

    #[test]
    fn condition_gates_until_replaced() {
        let (d, log) = recording(&["FOO", "BAZ"]);
        let mut r = Runner::new(d);
        r.scope_mut().set("x", 1i64);
        r.run("CONDITION: x = 1\nFOO bar\nCONDITION: x = 2\nBAZ qux").unwrap();
        assert_eq!(*log.lock().unwrap(), ["FOO bar"]);
        assert_eq!(r.stats().summary(), BTreeMap::from([("FOO".to_owned(), 1)]));
        assert_eq!(r.summary().skipped, 1);
    }

    #[test]
    fn condition_sees_results_of_earlier_commands() {
        let mut d = Dispatcher::new();
        d.register("DB", |_: &str| ExecutionResult::ok(Value::from(json!({"count": 0}))));
        let (_, log) = recording(&[]);
        let log2 = Arc::clone(&log);
        d.register("ALERT", move |b: &str| {
            log2.lock().unwrap().push(b.to_owned());
            ExecutionResult::ok(b)
        });
        let mut r = Runner::new(d);
        r.run("DB select count\nCONDITION: lastResult.payload.count = 0\nALERT empty")
            .unwrap();
        assert_eq!(*log.lock().unwrap(), ["empty"]);
    }

    #[test]
    fn unknown_target_is_recorded_not_fatal() {
        let (d, log) = recording(&["A"]);
        let mut r = Runner::new(d);
        r.run("UNKNOWN ping\nA after").unwrap();
        assert_eq!(*log.lock().unwrap(), ["A after"]);
        let summary = r.summary();
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.per_target.get("UNKNOWN"), Some(&1));
        assert_eq!(summary.state, RunState::Completed);
    }

    #[test]
    fn failed_result_is_bound() {
        let mut r = Runner::new(Dispatcher::new());
        r.run("UNKNOWN ping").unwrap();
        let last = r.scope().get(LAST_RESULT).unwrap();
        assert_eq!(last.field("success"), Some(&Value::Bool(false)));
        assert_eq!(
            last.field("error"),
            Some(&Value::Str("unknown target: UNKNOWN".into()))
        );
    }

    #[test]
    fn malformed_condition_aborts() {
        let (d, log) = recording(&["A"]);
        let mut r = Runner::new(d);
        let err = r.run("A first\nCONDITION: y > \nA second").unwrap_err();
        assert!(matches!(err, RunError::Evaluation { line: 2, .. }));
        assert_eq!(*log.lock().unwrap(), ["A first"]);
        assert!(matches!(
            r.state(),
            RunState::Aborted(AbortReason::Evaluation { line: 2, .. })
        ));
        assert_eq!(r.summary().attempted, 1);
    }

    #[test]
    fn unbound_variable_aborts_with_scope_snapshot() {
        let mut r = Runner::new(Dispatcher::new());
        r.scope_mut().set("x", 1i64);
        match r.run("CONDITION: y = 1\nA x") {
            Err(RunError::Evaluation { expression, scope, source, .. }) => {
                assert_eq!(expression, "y = 1");
                assert_eq!(scope, ["x=1"]);
                assert!(matches!(source, EvaluationError::Unbound(_)));
            }
            other => panic!("expected evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn query_results_are_routed_by_keyword() {
        let mut d = Dispatcher::new();
        d.register("BQ", |b: &str| ExecutionResult::ok(b));
        let mut r = Runner::new(d);
        r.run("BQ select * from orders\nBQ insert into reviews").unwrap();
        let orders = r.scope().get("orders").unwrap();
        assert_eq!(
            orders.field("payload"),
            Some(&Value::Str("select * from orders".into()))
        );
        assert!(!r.scope().contains("reviews"));
        assert_eq!(
            r.scope().resolve("lastResult.payload"),
            Some(&Value::Str("insert into reviews".into()))
        );
    }

    #[test]
    fn foreach_synthesizes_and_shares_stats() {
        let (mut d, log) = recording(&["PUBLISH"]);
        d.register("SHEETS", |_: &str| {
            ExecutionResult::ok(Value::from(json!([{"sku": "A"}, {"sku": "B"}])))
        });
        let mut r = Runner::new(d);
        r.run("SHEETS read orders\nFOREACH: orders -> PUBLISH {sku}").unwrap();
        assert_eq!(*log.lock().unwrap(), ["PUBLISH A", "PUBLISH B"]);
        assert_eq!(r.stats().count("PUBLISH"), 2);
        assert_eq!(r.stats().count("SHEETS"), 1);
    }

    #[test]
    fn foreach_respects_active_condition() {
        let (d, log) = recording(&["PUBLISH"]);
        let mut r = Runner::new(d);
        r.scope_mut().set("rows", Value::from(json!([1, 2])));
        r.scope_mut().set("go", false);
        r.run("CONDITION: go\nFOREACH: rows -> PUBLISH {.}").unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn sub_run_starts_unconditional_and_restores_parent_condition() {
        let (d, log) = recording(&["PUBLISH", "AFTER"]);
        let mut r = Runner::new(d);
        r.scope_mut().set("rows", Value::from(json!(["x"])));
        r.scope_mut().set("stage", 1i64);
        // The batch re-binds lastResult, which the parent condition ignores.
        r.run("CONDITION: stage = 1\nFOREACH: rows -> PUBLISH {.}\nAFTER done")
            .unwrap();
        assert_eq!(*log.lock().unwrap(), ["PUBLISH x", "AFTER done"]);
    }

    #[test]
    fn synthesized_foreach_is_not_expanded_again() {
        let (d, log) = recording(&["PUBLISH"]);
        let mut r = Runner::new(d);
        r.scope_mut().set("rows", Value::from(json!(["rows"])));
        // The template itself produces a FOREACH directive.
        r.run("FOREACH: rows -> FOREACH: {.} -> PUBLISH {.}").unwrap();
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(*r.state(), RunState::Completed);
    }

    #[test]
    fn foreach_over_unbound_source_aborts() {
        let mut r = Runner::new(Dispatcher::new());
        let err = r.run("FOREACH: nothing -> PUBLISH {sku}").unwrap_err();
        assert!(matches!(err, RunError::Evaluation { ref expression, .. } if expression == "nothing"));
    }

    #[test]
    fn foreach_over_failed_result_runs_nothing() {
        let (d, log) = recording(&["PUBLISH"]);
        let mut r = Runner::new(d);
        r.run("SHEETS read orders\nFOREACH: lastResult -> PUBLISH {sku}").unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn row_limit_applies() {
        let (d, log) = recording(&["N"]);
        let mut r = Runner::new(d).with_max_rows(2);
        r.scope_mut().set("rows", Value::from(json!([1, 2, 3, 4])));
        r.run("FOREACH: rows -> N {.}").unwrap();
        assert_eq!(*log.lock().unwrap(), ["N 1", "N 2"]);
    }

    #[test]
    fn cancellation_stops_at_token_boundary() {
        let mut d = Dispatcher::new();
        let token = CancelToken::new();
        let trip = token.clone();
        d.register("STOP", move |_: &str| {
            trip.cancel();
            ExecutionResult::ok("stopping")
        });
        let (_, log) = recording(&[]);
        let log2 = Arc::clone(&log);
        d.register("A", move |b: &str| {
            log2.lock().unwrap().push(b.to_owned());
            ExecutionResult::ok(b)
        });
        let mut r = Runner::new(d).with_cancel_token(token);
        let err = r.run("A one\nSTOP now\nA two").unwrap_err();
        assert!(matches!(err, RunError::Cancelled { line: 3 }));
        assert_eq!(*log.lock().unwrap(), ["one"]);
        // The in-flight dispatch completed and was counted.
        assert_eq!(r.stats().count("STOP"), 1);
        assert!(matches!(
            r.state(),
            RunState::Aborted(AbortReason::Cancelled { line: 3 })
        ));
    }

    #[test]
    fn cancellation_persists_until_reset() {
        let (d, log) = recording(&["A"]);
        let mut r = Runner::new(d);
        let token = r.cancel_token();
        token.cancel();
        assert!(matches!(r.run("A one"), Err(RunError::Cancelled { line: 1 })));
        assert!(matches!(r.run("A two"), Err(RunError::Cancelled { line: 1 })));
        token.reset();
        r.run("A three").unwrap();
        assert_eq!(*log.lock().unwrap(), ["A three"]);
        assert_eq!(*r.state(), RunState::Completed);
    }

    #[test]
    fn observer_sees_comments_and_progress() {
        let (d, _) = recording(&["A"]);
        let transcript = Transcript::new();
        let mut r = Runner::new(d).with_observer(transcript.clone());
        r.scope_mut().set("x", 2i64);
        r.run("# stage one\nA go\nCONDITION: x = 1\nA skip").unwrap();
        assert_eq!(
            transcript.lines(),
            [
                "# stage one",
                "A go -> ok",
                "CONDITION x = 1 -> false",
                "A skip -> skipped",
            ]
        );
    }

    #[test]
    fn run_synthesized_shares_stats_with_earlier_runs() {
        let (d, log) = recording(&["PUBLISH"]);
        let mut r = Runner::new(d);
        r.run("PUBLISH first").unwrap();
        let rows = [Value::from(json!({"sku": "A"})), Value::from(json!({"sku": "B"}))];
        r.run_synthesized("PUBLISH {sku}", &rows).unwrap();
        assert_eq!(*log.lock().unwrap(), ["PUBLISH first", "PUBLISH A", "PUBLISH B"]);
        assert_eq!(r.stats().count("PUBLISH"), 3);
    }

    #[test]
    fn summary_display() {
        let mut r = Runner::new(Dispatcher::new());
        r.run("X one").unwrap();
        let text = r.summary().to_string();
        assert!(text.contains("state:     completed"));
        assert!(text.contains("1 attempted, 1 failed, 0 skipped"));
        assert!(text.contains("X"));
    }
}
