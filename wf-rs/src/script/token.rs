//! Script tokenizer.
//!
//! A workflow script is a sequence of lines.  Each line becomes exactly one
//! [`Token`]; classification never fails, so a malformed directive surfaces
//! later, when the runner evaluates it.
//!
//! | Line shape | Kind |
//! |------------|------|
//! | `# text` | comment |
//! | empty or whitespace only | blank |
//! | `CONDITION: expr` | condition directive |
//! | `FOREACH: path -> template` | synthesis directive |
//! | `TARGET body…` | command |

/// Comment marker (first non-space character).
pub const COMMENT_MARKER: char = '#';
/// Prefix of the condition directive.
pub const CONDITION_PREFIX: &str = "CONDITION:";
/// Prefix of the synthesis directive.
pub const FOREACH_PREFIX: &str = "FOREACH:";
/// Separator between the row source and the template in `FOREACH:`.
pub const FOREACH_ARROW: &str = "->";

/// What a line does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    Blank,
    Condition { expression: String },
    ForEach { source: String, template: String },
    Command { target: String, body: String },
}

/// One classified script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The line exactly as it appeared in the source.
    pub raw: String,
    /// 1-based source line number.
    pub line: usize,
}

impl Token {
    pub fn is_command(&self) -> bool {
        matches!(self.kind, TokenKind::Command { .. })
    }

    /// Comment text with the marker and surrounding spaces removed.
    pub fn comment_text(&self) -> Option<&str> {
        match self.kind {
            TokenKind::Comment => Some(
                self.raw
                    .trim_start()
                    .trim_start_matches(COMMENT_MARKER)
                    .trim(),
            ),
            _ => None,
        }
    }
}

/// Split script text into tokens, one per line, in source order.
pub fn tokenize(src: &str) -> Vec<Token> {
    src.lines()
        .enumerate()
        .map(|(i, raw)| Token {
            kind: classify(raw),
            raw: raw.to_owned(),
            line: i + 1,
        })
        .collect()
}

fn classify(raw: &str) -> TokenKind {
    let line = raw.trim_start();

    if line.starts_with(COMMENT_MARKER) {
        return TokenKind::Comment;
    }
    if line.trim_end().is_empty() {
        return TokenKind::Blank;
    }
    if let Some(rest) = line.strip_prefix(CONDITION_PREFIX) {
        return TokenKind::Condition {
            expression: rest.trim().to_owned(),
        };
    }
    if let Some(rest) = line.strip_prefix(FOREACH_PREFIX) {
        if let Some((source, template)) = rest.split_once(FOREACH_ARROW) {
            return TokenKind::ForEach {
                source: source.trim().to_owned(),
                template: template.trim().to_owned(),
            };
        }
        // No arrow: falls through and dispatches like any other command.
    }

    let (target, body) = match line.find(char::is_whitespace) {
        Some(idx) => {
            let (target, rest) = line.split_at(idx);
            // Drop only the single separating whitespace character.
            let sep = rest.chars().next().map_or(0, char::len_utf8);
            (target, &rest[sep..])
        }
        None => (line, ""),
    };
    TokenKind::Command {
        target: target.to_owned(),
        body: body.to_owned(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
