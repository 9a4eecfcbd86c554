//! Built-in backends.
//!
//! Service integrations proper (warehouses, document stores, queues) live
//! outside this crate and plug in through [`crate::dispatch::Handler`].  The
//! handlers here cover the generic plumbing a script needs out of the box.

pub mod echo;
pub mod file;
pub mod http;

pub use echo::{EchoHandler, FixtureHandler};
pub use file::{FileHandler, FileWriter, FsWriter, WriteOutcome};
pub use http::{is_error_marker, HttpClient, HttpHandler, UreqClient, ERROR_MARKER};
