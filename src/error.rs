//! Error taxonomy for the tailing engine.
//!
//! None of these variants are allowed to unwind out of the event loop: they
//! are constructed, logged, and handled locally. The only way this process
//! exits with a non-zero code is a `ConfigurationError` (caught in `main`
//! before tailing starts) or a panic from something outside this crate's
//! control (OOM, a handler panicking past `catch_unwind`, etc).

use std::io;
use std::path::PathBuf;

/// Recoverable conditions the tailing engine can run into.
///
/// Every variant here is logged at the call site and then discarded; this
/// type exists to give the log messages a consistent shape and to let tests
/// assert on *kind* without parsing log strings.
#[derive(thiserror::Error, Debug)]
pub enum TailError {
    /// A read or close failed on a watched file. The next `MODIFY` retries.
    #[error("transient I/O error on {path}: {source}")]
    TransientIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The kernel watch could not be installed, usually because the file
    /// doesn't exist yet. The directory watch will notice its creation.
    #[error("could not install watch on {path}: {source}")]
    WatchInstallFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A handler panicked while processing a line.
    #[error("handler {handler} failed on line {line:?}")]
    HandlerFailure { handler: String, line: String },
}

/// Errors that abort the program before any tailing starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("offline mode is not implemented")]
    OfflineNotImplemented,

    #[error("handler testcases failed under --testcases=strict")]
    TestcasesFailed,
}
