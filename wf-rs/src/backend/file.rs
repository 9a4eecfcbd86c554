//! Filesystem backend.
//!
//! Command body: `<path> <content…>`.  The content is the rest of the line
//! after the path; `\n` escapes in it become newlines so one script line can
//! write a multi-line file.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::dispatch::{ExecutionResult, Handler};

/// Result of a write.  Failure detail goes to the log, not the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub success: bool,
}

/// Persists a string to a path.
pub trait FileWriter: Send {
    fn write(&mut self, path: &Path, content: &str) -> WriteOutcome;
}

/// [`FileWriter`] over the local filesystem, optionally rooted at a
/// directory.  A rooted writer only accepts relative paths without `..`.
#[derive(Debug, Clone, Default)]
pub struct FsWriter {
    root: Option<PathBuf>,
}

impl FsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        FsWriter {
            root: Some(root.into()),
        }
    }
}

impl FileWriter for FsWriter {
    fn write(&mut self, path: &Path, content: &str) -> WriteOutcome {
        let full = match &self.root {
            // Rooted writes stay under the root: no absolute paths, no `..`.
            Some(root) => {
                let contained = path
                    .components()
                    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
                if !contained {
                    warn!(path = %path.display(), root = %root.display(), "path escapes root");
                    return WriteOutcome { success: false };
                }
                root.join(path)
            }
            None => path.to_path_buf(),
        };
        let res = full
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&full, content));
        match res {
            Ok(()) => WriteOutcome { success: true },
            Err(e) => {
                debug!(path = %full.display(), error = %e, "write failed");
                WriteOutcome { success: false }
            }
        }
    }
}

/// Dispatch target that writes files through a [`FileWriter`].
pub struct FileHandler<W: FileWriter> {
    writer: W,
}

impl<W: FileWriter> FileHandler<W> {
    pub fn new(writer: W) -> Self {
        FileHandler { writer }
    }
}

impl<W: FileWriter> Handler for FileHandler<W> {
    fn dispatch(&mut self, body: &str) -> ExecutionResult {
        let body = body.trim_start();
        let (path, content) = match body.split_once(char::is_whitespace) {
            Some((path, content)) => (path, content),
            None => (body, ""),
        };
        if path.is_empty() {
            return ExecutionResult::fail("usage: <path> <content>");
        }
        let content = content.replace("\\n", "\n");
        if self.writer.write(Path::new(path), &content).success {
            ExecutionResult::ok(path)
        } else {
            ExecutionResult::fail(format!("write failed: {path}"))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
