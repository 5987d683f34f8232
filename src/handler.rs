//! Handler Dispatch (spec.md §4.4) and the table-driven test harness
//! (SPEC_FULL §2, grounded on `original_source/tests.py` and
//! `program_example.py`'s `testcases`/`testcase_args` class attributes).

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::TailError;
use crate::metrics::MetricsRegistry;

/// A user-supplied line handler. The engine guarantees at-most-one
/// concurrent `process` call per handler, in file order, for the lifetime
/// of the process (spec.md §3 "Lifecycle").
///
/// This is the explicit-trait replacement for the original's
/// `AbstractLineHandler` + metaclass subclass registry (spec.md §9): there
/// is no implicit registry here, handlers are wired up by the caller.
pub trait LineHandler: Send + Sync {
    /// Handle one complete line (never includes the trailing `\n`).
    fn process(&self, line: &str);

    /// Identifies this handler in logs and in the test harness, replacing
    /// the original's `self.logger` property (which derived its name from
    /// `type(self).__name__`).
    fn name(&self) -> &str;

    /// Optional self-test cases. `None` means "no testcases declared",
    /// which `run_handler_tests` treats the same way the original does:
    /// a warning, not a failure, unless the handler opts out entirely by
    /// returning `Some(vec![])`.
    fn testcases(&self) -> Option<Vec<Testcase>> {
        None
    }
}

/// One self-test case for a `LineHandler`.
pub struct Testcase {
    pub name: &'static str,
    /// Lines fed through `process`, in order.
    pub input: &'static [&'static str],
    /// Substrings the metrics exposition text must contain afterwards.
    /// Owned (rather than `&'static str`) because handlers whose metrics
    /// carry a per-instance label (e.g. a `filename` label) need to build
    /// the expected substring from their own `name()` at test time.
    pub expect_contains: Vec<String>,
}

/// Feeds each line in `lines` to every handler registered for a path, in
/// handler-registration order, isolating failures per spec.md §4.4: a
/// handler that panics is logged with the offending line and the handler's
/// name, and dispatch continues with the next handler and next line.
pub fn dispatch_line(handlers: &[Arc<dyn LineHandler>], line: &str) {
    for handler in handlers {
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.process(line)));
        if result.is_err() {
            let err = TailError::HandlerFailure {
                handler: handler.name().to_string(),
                line: line.to_string(),
            };
            log::error!("{}", err);
        }
    }
}

/// Runs every distinct handler's self-test cases, mirroring the original's
/// `run_testcases`: handlers are deduplicated by name (the original dedups
/// by `type()`), each testcase's input is fed through `process`, and the
/// resulting metrics exposition text is checked for the expected
/// substrings. Returns `(failures, errors)` exactly as the original's
/// tuple return did.
pub fn run_handler_tests(handlers: &[Arc<dyn LineHandler>], metrics: &MetricsRegistry) -> (usize, usize) {
    let mut seen = std::collections::HashSet::new();
    let mut failures = 0;
    let mut errors = 0;

    for handler in handlers {
        if !seen.insert(handler.name().to_string()) {
            continue;
        }

        match handler.testcases() {
            None => {
                log::warn!("{} has no testcases.", handler.name());
            }
            Some(cases) if cases.is_empty() => {
                log::info!("{} has no testcases.", handler.name());
            }
            Some(cases) => {
                let mut ran = 0;
                let mut case_failures = 0;
                for case in cases {
                    ran += 1;
                    for line in case.input {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.process(line)));
                        if outcome.is_err() {
                            errors += 1;
                            log::warn!("{}: testcase {} errored on {:?}", handler.name(), case.name, line);
                        }
                    }

                    let exposition = metrics.gather_text();
                    for expected in &case.expect_contains {
                        if !exposition.contains(expected.as_str()) {
                            case_failures += 1;
                            failures += 1;
                            log::warn!(
                                "{}: testcase {} expected exposition to contain {:?}",
                                handler.name(),
                                case.name,
                                expected
                            );
                        }
                    }
                }

                let level = if case_failures > 0 { log::Level::Warn } else { log::Level::Info };
                log::log!(
                    level,
                    "{} executed {} testcases: {} failures",
                    handler.name(),
                    ran,
                    case_failures
                );
            }
        }
    }

    (failures, errors)
}
