//! `.wfrc` configuration file parser.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | initial scope binding |
//! | `/keywords <word>…` | ordered routing candidates |
//! | `/verbs <word>…` | query verbs |
//! | `/max_rows <n>` | synthesis row limit |
//! | `/http <NAME> [<base_url>]` | register an HTTP backend |
//! | `/file <NAME> [<root>]` | register a file-writing backend |
//! | `/echo <NAME>` | register an echo backend |
//! | `/fixture <NAME> <json>` | register a canned-payload backend |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//!
//! Target directives add to the defaults (`HTTP`, `FILE`, `ECHO`); a later
//! directive for the same name replaces the earlier one.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backend::{EchoHandler, FileHandler, FixtureHandler, FsWriter, HttpHandler, UreqClient};
use crate::dispatch::Dispatcher;
use crate::route::{ResultRouter, DEFAULT_KEYWORDS, DEFAULT_QUERY_VERBS};
use crate::script::synth::DEFAULT_MAX_ROWS;
use crate::script::value::{parse_scalar, Value};
use crate::var::Scope;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// A backend to register under `name`.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSpec {
    Http { name: String, base_url: Option<String> },
    File { name: String, root: Option<PathBuf> },
    Echo { name: String },
    Fixture { name: String, payload: Value },
}

impl TargetSpec {
    pub fn name(&self) -> &str {
        match self {
            TargetSpec::Http { name, .. }
            | TargetSpec::File { name, .. }
            | TargetSpec::Echo { name }
            | TargetSpec::Fixture { name, .. } => name,
        }
    }
}

/// Parsed configuration: initial scope, routing lists, and backends.
#[derive(Debug, Clone)]
pub struct Config {
    pub vars: Scope,
    pub keywords: Vec<String>,
    pub verbs: Vec<String>,
    pub max_rows: usize,
    pub targets: Vec<TargetSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vars: Scope::new(),
            keywords: DEFAULT_KEYWORDS.iter().map(|&s| s.to_owned()).collect(),
            verbs: DEFAULT_QUERY_VERBS.iter().map(|&s| s.to_owned()).collect(),
            max_rows: DEFAULT_MAX_ROWS,
            targets: vec![
                TargetSpec::Http { name: "HTTP".into(), base_url: None },
                TargetSpec::File { name: "FILE".into(), root: None },
                TargetSpec::Echo { name: "ECHO".into() },
            ],
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Returns the config and a list of any parse errors on recognised lines.
    /// A bad line leaves the setting it names unchanged.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let args_str = args_str.trim();

            let res = match cmd {
                "set" => parse_set(&split_args(args_str), &mut config.vars),
                "keywords" => parse_words("/keywords", args_str).map(|w| config.keywords = w),
                "verbs" => parse_words("/verbs", args_str).map(|w| config.verbs = w),
                "max_rows" => parse_max_rows(args_str).map(|n| config.max_rows = n),
                "http" | "file" | "echo" | "fixture" => {
                    parse_target(cmd, args_str).map(|t| config.upsert_target(t))
                }
                _ => Ok(()),
            };
            if let Err(message) = res {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    pub fn upsert_target(&mut self, spec: TargetSpec) {
        match self.targets.iter_mut().find(|t| t.name() == spec.name()) {
            Some(slot) => *slot = spec,
            None => self.targets.push(spec),
        }
    }

    /// A dispatcher with every configured target registered.
    pub fn dispatcher(&self) -> Dispatcher {
        let mut d = Dispatcher::new();
        for spec in &self.targets {
            match spec {
                TargetSpec::Http { name, base_url } => {
                    let mut h = HttpHandler::new(UreqClient::default());
                    if let Some(base) = base_url {
                        h = h.with_base_url(base.clone());
                    }
                    d.register(name.clone(), h);
                }
                TargetSpec::File { name, root } => {
                    let writer = match root {
                        Some(root) => FsWriter::rooted(root.clone()),
                        None => FsWriter::new(),
                    };
                    d.register(name.clone(), FileHandler::new(writer));
                }
                TargetSpec::Echo { name } => d.register(name.clone(), EchoHandler),
                TargetSpec::Fixture { name, payload } => {
                    d.register(name.clone(), FixtureHandler::new(payload.clone()))
                }
            }
        }
        d
    }

    pub fn router(&self) -> ResultRouter {
        ResultRouter::new(self.verbs.iter().cloned(), self.keywords.iter().cloned())
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── Directives ────────────────────────────────────────────────────────────────

fn parse_set(tokens: &[String], vars: &mut Scope) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("/set: requires an argument".into());
    }

    let (name, value) = if let Some((name, value)) = tokens[0].split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{}'", tokens[0]));
    };

    if name.is_empty() {
        return Err("/set: variable name cannot be empty".into());
    }

    vars.set(name, parse_scalar(&value));
    Ok(())
}

fn parse_words(directive: &str, args: &str) -> Result<Vec<String>, String> {
    let words = split_args(args);
    if words.is_empty() {
        return Err(format!("{directive}: requires at least one word"));
    }
    Ok(words)
}

fn parse_max_rows(args: &str) -> Result<usize, String> {
    args.parse()
        .map_err(|_| format!("/max_rows: not a row count: '{args}'"))
}

fn parse_target(cmd: &str, args: &str) -> Result<TargetSpec, String> {
    // `/fixture` keeps its payload verbatim; JSON is full of quotes.
    let (name, rest) = args
        .split_once(|c: char| c.is_ascii_whitespace())
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((args, ""));
    if name.is_empty() {
        return Err(format!("/{cmd}: requires a target name"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(format!("/{cmd}: bad target name '{name}'"));
    }
    let name = name.to_owned();
    let opt = |s: &str| (!s.is_empty()).then(|| s.to_owned());

    match cmd {
        "http" => Ok(TargetSpec::Http { name, base_url: opt(rest) }),
        "file" => Ok(TargetSpec::File { name, root: opt(rest).map(PathBuf::from) }),
        "echo" if rest.is_empty() => Ok(TargetSpec::Echo { name }),
        "echo" => Err(format!("/echo: unexpected argument '{rest}'")),
        _ => {
            if rest.is_empty() {
                return Err(format!("/fixture: missing payload for '{name}'"));
            }
            let json: serde_json::Value =
                serde_json::from_str(rest).map_err(|e| format!("/fixture: {e}"))?;
            Ok(TargetSpec::Fixture { name, payload: json.into() })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ExecutionResult;

    // -- split_args -----------------------------------------------------------

    #[test]
    fn split_simple() {
        assert_eq!(split_args("foo bar baz"), ["foo", "bar", "baz"]);
    }

    #[test]
    fn split_quoted_spaces() {
        assert_eq!(split_args(r#""hello world" 42"#), ["hello world", "42"]);
    }

    #[test]
    fn split_escaped_quote_inside_quotes() {
        assert_eq!(split_args(r#""say \"hi\"""#), [r#"say "hi""#]);
    }

    // -- /set -----------------------------------------------------------------

    #[test]
    fn set_equals_syntax_detects_numbers() {
        let (cfg, errs) = Config::load_str("/set threshold=5");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("threshold"), Some(&Value::Int(5)));
    }

    #[test]
    fn set_value_with_spaces() {
        let (cfg, errs) = Config::load_str("/set greeting hello world");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("greeting"), Some(&Value::Str("hello world".into())));
    }

    #[test]
    fn set_without_value_is_error() {
        let (_, errs) = Config::load_str("/set lonely");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 1);
    }

    // -- Routing --------------------------------------------------------------

    #[test]
    fn defaults() {
        let cfg = Config::new();
        assert_eq!(cfg.keywords, ["orders", "inventory", "reviews"]);
        assert_eq!(cfg.max_rows, DEFAULT_MAX_ROWS);
        assert_eq!(cfg.dispatcher().targets(), ["ECHO", "FILE", "HTTP"]);
    }

    #[test]
    fn keywords_and_verbs_replace_defaults() {
        let (cfg, errs) = Config::load_str("/keywords users accounts\n/verbs fetch");
        assert!(errs.is_empty(), "{errs:?}");
        let router = cfg.router();
        assert_eq!(router.route("fetch accounts"), Some("accounts"));
        assert_eq!(router.route("select accounts"), None);
    }

    #[test]
    fn empty_keyword_list_is_error() {
        let (cfg, errs) = Config::load_str("/keywords");
        assert_eq!(errs.len(), 1);
        assert_eq!(cfg.keywords.len(), 3);
    }

    #[test]
    fn max_rows() {
        let (cfg, errs) = Config::load_str("/max_rows 25\n/max_rows lots");
        assert_eq!(cfg.max_rows, 25);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 2);
    }

    // -- Targets --------------------------------------------------------------

    #[test]
    fn http_with_base_url() {
        let (cfg, errs) = Config::load_str("/http API https://api.example.com");
        assert!(errs.is_empty(), "{errs:?}");
        assert!(cfg.targets.contains(&TargetSpec::Http {
            name: "API".into(),
            base_url: Some("https://api.example.com".into()),
        }));
    }

    #[test]
    fn redeclared_target_replaces() {
        let (cfg, errs) = Config::load_str("/echo HTTP");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.targets.len(), 3);
        let mut d = cfg.dispatcher();
        assert_eq!(d.dispatch("HTTP", "GET /x"), ExecutionResult::ok("GET /x"));
    }

    #[test]
    fn fixture_keeps_json_verbatim() {
        let (cfg, errs) = Config::load_str(r#"/fixture SHEETS [{"sku": "A B"}]"#);
        assert!(errs.is_empty(), "{errs:?}");
        let mut d = cfg.dispatcher();
        let res = d.dispatch("SHEETS", "read orders");
        let sku = res.payload().and_then(|p| p.field("0")).and_then(|r| r.field("sku"));
        assert_eq!(sku, Some(&Value::Str("A B".into())));
    }

    #[test]
    fn bad_fixture_is_error() {
        let (cfg, errs) = Config::load_str("/fixture SHEETS {oops\n/fixture EMPTY");
        assert_eq!(errs.len(), 2);
        assert!(errs[0].to_string().starts_with("line 1: /fixture"));
        assert!(!cfg.targets.iter().any(|t| t.name() == "SHEETS"));
    }

    #[test]
    fn file_target_with_root() {
        let (cfg, errs) = Config::load_str("/file OUT /tmp/wf-out");
        assert!(errs.is_empty(), "{errs:?}");
        assert!(cfg.targets.contains(&TargetSpec::File {
            name: "OUT".into(),
            root: Some(PathBuf::from("/tmp/wf-out")),
        }));
    }

    // -- Comments & skipping --------------------------------------------------

    #[test]
    fn comments_and_unknown_commands_skipped() {
        let (cfg, errs) = Config::load_str(
            ";; comment\n\
             ; another\n\
             /def something = else\n\
             not a directive\n\
             /set loaded=yes",
        );
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.len(), 1);
        assert!(cfg.vars.contains("loaded"));
    }

    #[test]
    fn realistic_wfrc() {
        let src = "\
;; nightly sync\n\
\n\
/http SHOP https://shop.example.com/api\n\
/fixture SHEETS {\"payload\": [{\"sku\": \"A\"}]}\n\
/keywords orders inventory\n\
/max_rows 50\n\
/set region=eu\n\
/set dry_run=true\n\
";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.targets.len(), 5);
        assert_eq!(cfg.max_rows, 50);
        assert_eq!(cfg.vars.get("dry_run"), Some(&Value::Bool(true)));
        assert_eq!(cfg.vars.get("region"), Some(&Value::Str("eu".into())));
    }

    #[test]
    fn load_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wfrc");
        std::fs::write(&path, "/set x=1\n").unwrap();
        let (cfg, errs) = Config::load_file(&path).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.vars.get("x"), Some(&Value::Int(1)));
        assert!(Config::load_file(&dir.path().join("missing")).is_err());
    }
}
