use std::io::Read;
use std::process::ExitCode;

use crossterm::style::Stylize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use wf::cli::{self, CliArgs, ConfigFile, ScriptSource};
use wf::config::Config;
use wf::observer::StdoutObserver;
use wf::runner::{RunState, RunSummary, Runner};

const EXIT_ERROR: u8 = 1;
const EXIT_ABORTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("wf: {e}");
            eprintln!("{}", cli::USAGE);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    init_logging(args.debug);

    // ── Load config ───────────────────────────────────────────────────────────
    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("wf: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    // ── Read script ───────────────────────────────────────────────────────────
    let script = match read_script(&args.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("wf: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let is_tty = unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 };

    let mut scope = config.vars.clone();
    for (name, value) in args.defines {
        scope.set(name, value);
    }
    let runner = Runner::new(config.dispatcher())
        .with_scope(scope)
        .with_router(config.router())
        .with_max_rows(config.max_rows)
        .with_observer(StdoutObserver {
            quiet: args.quiet || args.json,
            color: is_tty,
        });

    // ── Run ───────────────────────────────────────────────────────────────────
    // Backends block, so the run gets its own thread; Ctrl-C trips the
    // runner's cancel token and the run stops at the next line.
    let cancel = runner.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });

    let summary = match tokio::task::spawn_blocking(move || {
        let mut runner = runner;
        if let Err(e) = runner.run(&script) {
            eprintln!("wf: {e}");
        }
        runner.summary()
    })
    .await
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("wf: run failed: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    print_summary(&summary, args.json, is_tty);

    match summary.state {
        RunState::Aborted(_) => ExitCode::from(EXIT_ABORTED),
        _ => ExitCode::SUCCESS,
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("WF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &CliArgs) -> Result<Config, String> {
    let path = match &args.config {
        ConfigFile::Skip => return Ok(Config::new()),
        ConfigFile::Explicit(p) => p.clone(),
        ConfigFile::Search => match cli::find_config() {
            Some(p) => p,
            None => return Ok(Config::new()),
        },
    };
    debug!(path = %path.display(), "loading config");
    let (config, errors) =
        Config::load_file(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    for e in &errors {
        eprintln!("wf: warning: {}: {e}", path.display());
    }
    Ok(config)
}

fn read_script(source: &ScriptSource) -> Result<String, String> {
    match source {
        ScriptSource::File(path) => {
            std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))
        }
        ScriptSource::Stdin => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .map_err(|e| format!("stdin: {e}"))?;
            Ok(s)
        }
    }
}

fn print_summary(summary: &RunSummary, json: bool, color: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("wf: {e}"),
        }
        return;
    }
    let text = summary.to_string();
    if !color {
        print!("{text}");
        return;
    }
    for line in text.lines() {
        match line.strip_prefix("state:") {
            Some(state) if matches!(summary.state, RunState::Completed) => {
                println!("state:{}", state.green())
            }
            Some(state) => println!("state:{}", state.red().bold()),
            None => println!("{line}"),
        }
    }
}
