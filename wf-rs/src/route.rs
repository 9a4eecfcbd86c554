//! Result routing by keyword.
//!
//! Every dispatched result is bound to `lastResult`.  A command whose body
//! is a query (its first word is a configured query verb) is additionally
//! bound under a name picked by keyword: the first candidate, in configured
//! order, that occurs anywhere in the body.  Matching ignores ASCII case.
//!
//! ```
//! use wf::route::ResultRouter;
//!
//! let router = ResultRouter::new(["select"], ["orders", "inventory"]);
//! assert_eq!(router.route("SELECT * FROM inventory JOIN orders"), Some("orders"));
//! assert_eq!(router.route("insert into orders"), None);
//! ```

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};

/// Binding that always holds the most recent result.
pub const LAST_RESULT: &str = "lastResult";

pub const DEFAULT_QUERY_VERBS: &[&str] = &["select", "query", "find", "get", "read"];
pub const DEFAULT_KEYWORDS: &[&str] = &["orders", "inventory", "reviews"];

/// Chooses the named binding for a query result.
#[derive(Debug, Clone)]
pub struct ResultRouter {
    verbs: Vec<String>,
    keywords: Vec<String>,
    matcher: AhoCorasick,
}

impl ResultRouter {
    pub fn new<V, K>(verbs: V, keywords: K) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let verbs = verbs.into_iter().map(Into::into).collect();
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        let matcher = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&keywords);
        ResultRouter {
            verbs,
            keywords,
            matcher,
        }
    }

    /// Whether `body` reads as a query.
    pub fn is_query(&self, body: &str) -> bool {
        body.split_whitespace()
            .next()
            .is_some_and(|first| self.verbs.iter().any(|v| v.eq_ignore_ascii_case(first)))
    }

    /// Binding name for a query body, if any keyword matches.
    pub fn route(&self, body: &str) -> Option<&str> {
        if !self.is_query(body) {
            return None;
        }
        // Overlapping search sees every occurrence; the lowest pattern index
        // is the earliest candidate in configured order.
        self.matcher
            .find_overlapping_iter(body)
            .map(|m| m.pattern())
            .min()
            .map(|i| self.keywords[i].as_str())
    }
}

impl Default for ResultRouter {
    fn default() -> Self {
        Self::new(
            DEFAULT_QUERY_VERBS.iter().copied(),
            DEFAULT_KEYWORDS.iter().copied(),
        )
    }
}
