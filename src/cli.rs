//! Configuration (SPEC_FULL §2, §6): CLI argument parsing via `clap`'s
//! derive API, and the logging level computation spec.md §6 specifies.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// What to do with the registered handlers' self-tests before starting the
/// event loop. A direct rendering of the original's
/// `choices=['skip', 'strict', 'run', 'run-then-quit']`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum TestMode {
    /// Don't run testcases at all.
    Skip,
    /// Run testcases; abort with exit code 9 on any failure.
    Strict,
    /// Run testcases, log the outcome, then start the event loop regardless.
    Run,
    /// Run testcases then exit (0 on success, 9 on failure) without
    /// starting the event loop.
    RunThenQuit,
}

#[derive(Debug, Parser)]
#[command(name = "logtail-exporter", about = "Rotation-resilient log-tailing metrics exporter")]
pub struct Config {
    /// Lowers the log threshold by 10 per occurrence.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Raises the log threshold by 10 per occurrence.
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// HTTP listen port.
    #[arg(short = 'p', long = "port", default_value_t = 9123)]
    pub port: u16,

    /// Reserved: not implemented in the core.
    #[arg(short = 'o', long = "offline")]
    pub offline: bool,

    /// Run registered handlers' self-tests before starting.
    #[arg(short = 't', long = "testcases", value_enum, default_value_t = TestMode::Run)]
    pub testcases: TestMode,

    /// Stop after N event-loop iterations; -1 runs forever. Hidden: an
    /// internal escape hatch for tests, not a user-facing knob.
    #[arg(long = "max-polls", default_value_t = -1, hide = true)]
    pub max_polls: i64,

    /// Log files to tail, each wired up to the built-in demo handlers
    /// (see `demo_handlers`). Analogous to the `myfiles` list the original
    /// passed into `run()` programmatically.
    pub files: Vec<PathBuf>,
}

/// `desired = INFO - 10*verbose + 10*quiet`, matching the original's
/// `logging.INFO - 10 * verbose + 10 * quiet`. The original only emits
/// records with `level >= desired`, so the default (zero flags, `desired =
/// 20`) shows INFO and above but suppresses DEBUG; each bucket below
/// mirrors that threshold rather than the numeric level itself.
pub fn level_filter(verbose: u8, quiet: u8) -> log::LevelFilter {
    const INFO: i32 = 20;
    let desired = INFO - 10 * i32::from(verbose) + 10 * i32::from(quiet);
    if desired <= 10 {
        log::LevelFilter::Debug
    } else if desired <= 20 {
        log::LevelFilter::Info
    } else if desired <= 30 {
        log::LevelFilter::Warn
    } else if desired <= 40 {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Off
    }
}

pub fn init_logging(config: &Config) {
    let level = level_filter(config.verbose, config.quiet);
    env_logger::Builder::new().filter_level(level).init();
}
