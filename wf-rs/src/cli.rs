//! Command-line argument parsing.
//!
//! Usage:
//!   wf [-c<config>] [-C] [-D<name>=<value>]… [-qdj] [<script>|-]

use std::path::PathBuf;

use thiserror::Error;

use crate::script::value::{parse_scalar, Value};

// ── Public types ──────────────────────────────────────────────────────────────

pub const USAGE: &str = "Usage: wf [-c<config>] [-C] [-D<name>=<value>]... [-qdj] [<script>|-]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown option: -{0}")]
    UnknownOption(char),
    #[error("-{0} requires an argument")]
    MissingArgument(char),
    #[error("-D expects name=value, got '{0}'")]
    BadDefine(String),
    #[error("too many arguments ({0})")]
    TooManyArguments(usize),
}

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which config file to load.
    pub config: ConfigFile,
    /// Bindings from `-D`, applied after the config file.
    pub defines: Vec<(String, Value)>,
    /// Suppress comment echo and progress (`-q`).
    pub quiet: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Print the summary as JSON (`-j`).
    pub json: bool,
    pub script: ScriptSource,
}

/// How to choose the config file.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum ConfigFile {
    /// Search `$WF_CONFIG`, the user config dir, then `./.wfrc` (default).
    #[default]
    Search,
    /// `-C`: built-in defaults only.
    Skip,
    /// `-c<file>`: load this specific file.
    Explicit(PathBuf),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum ScriptSource {
    #[default]
    Stdin,
    File(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`.
pub fn parse_args() -> Result<CliArgs, CliError> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, CliError> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'q' => args.quiet = true,
                'd' => args.debug = true,
                'j' => args.json = true,
                'C' => args.config = ConfigFile::Skip,

                // Options taking a value: `-c<file>` or `-c <file>`.
                c @ ('c' | 'D') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(CliError::MissingArgument(c));
                    };
                    if c == 'c' {
                        args.config = ConfigFile::Explicit(PathBuf::from(value));
                    } else {
                        args.defines.push(parse_define(&value)?);
                    }
                }

                c => return Err(CliError::UnknownOption(c)),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 if positional[0] == "-" => {}
        1 => args.script = ScriptSource::File(PathBuf::from(positional.remove(0))),
        n => return Err(CliError::TooManyArguments(n)),
    }

    Ok(args)
}

fn parse_define(s: &str) -> Result<(String, Value), CliError> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_owned(), parse_scalar(value))),
        _ => Err(CliError::BadDefine(s.to_owned())),
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the config file in the standard locations.
///
/// Priority: `WF_CONFIG` env var → `<config dir>/wf/wfrc` → `./.wfrc`.
/// Returns the first path that exists, or `None`.
pub fn find_config() -> Option<PathBuf> {
    let from_env = std::env::var_os("WF_CONFIG").map(PathBuf::from);
    let user = directories::ProjectDirs::from("", "", "wf").map(|d| d.config_dir().join("wfrc"));
    [from_env, user, Some(PathBuf::from("./.wfrc"))]
        .into_iter()
        .flatten()
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
