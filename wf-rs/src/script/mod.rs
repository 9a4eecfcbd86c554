//! Workflow script language.
//!
//! A script is a sequence of lines, each classified on its own:
//!
//! - `# text`: comment, reported to the observer
//! - `CONDITION: <expr>`: replaces the active condition
//! - `FOREACH: <path> -> <template>`: one synthesized command per result row
//! - `TARGET body…`: a command for the backend named `TARGET`
//!
//! ```rust
//! use wf::script::{tokenize, TokenKind};
//!
//! let toks = tokenize("# hello\nCONDITION: x = 1\nFOO bar");
//! assert!(matches!(toks[1].kind, TokenKind::Condition { .. }));
//! assert!(toks[2].is_command());
//! ```

pub mod expr;
pub mod synth;
pub mod token;
pub mod value;

// Re-exports for convenience.
pub use expr::{evaluate, Bindings, Condition, EvaluationError};
pub use synth::{rows_of, synthesize};
pub use token::{tokenize, Token, TokenKind};
pub use value::Value;
