//! Demo handlers (SPEC_FULL "Demo handlers"), grounded in
//! `original_source/program_example.py`'s `LineCounter`, `LetterCounter`,
//! and `PrintingLineHandler`. Not part of the library's core contract; the
//! `demos/` example binary and the crate's own tests use these as
//! realistic, non-trivial `LineHandler` implementations.
//!
//! Mirroring the original's class-level `Counter('linecount', ...,
//! ['filename'])`, each metric here is a single `IntCounterVec` labeled by
//! `filename` and shared across every per-file handler instance, rather
//! than one uniquely-named metric per file (which would both collide on
//! registration and reject path separators as metric-name characters).

use std::sync::atomic::{AtomicU64, Ordering};

use prometheus::{IntCounterVec, Opts, Registry};

use crate::handler::{LineHandler, Testcase};

/// Counts lines seen, labeled by filename, mirroring the original's
/// `self.linecounter.labels(self.filename).inc()`.
pub struct LineCounter {
    name: String,
    metric: IntCounterVec,
}

impl LineCounter {
    /// Registers the shared `lines_total{filename}` vector. Call once per
    /// `Registry` and share the result across every file's `LineCounter`.
    pub fn metric(registry: &Registry) -> IntCounterVec {
        let metric = IntCounterVec::new(
            Opts::new("lines_total", "Number of lines observed, by file."),
            &["filename"],
        )
        .expect("metric name/help are valid");
        registry
            .register(Box::new(metric.clone()))
            .expect("lines_total is registered exactly once");
        metric
    }

    /// `metric` must be the vector returned by [`LineCounter::metric`],
    /// registered once and shared across every file's `LineCounter`.
    pub fn new(name: impl Into<String>, metric: &IntCounterVec) -> Self {
        LineCounter {
            name: name.into(),
            metric: metric.clone(),
        }
    }
}

impl LineHandler for LineCounter {
    fn process(&self, _line: &str) {
        self.metric.with_label_values(&[&self.name]).inc();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn testcases(&self) -> Option<Vec<Testcase>> {
        Some(vec![Testcase {
            name: "counts_three_lines",
            input: &["alpha", "beta", "gamma"],
            expect_contains: vec![format!("lines_total{{filename=\"{}\"}} 3", self.name)],
        }])
    }
}

/// Counts upper- and lower-case letters seen, mirroring the original's
/// `LetterCounter` (two label values of one vector, incremented per
/// `str.isupper`/`islower` character).
pub struct LetterCounter {
    name: String,
    metric: IntCounterVec,
}

impl LetterCounter {
    pub fn metric(registry: &Registry) -> IntCounterVec {
        let metric = IntCounterVec::new(
            Opts::new("letters_total", "Number of letters observed, by file and case."),
            &["filename", "lettertype"],
        )
        .expect("metric name/help are valid");
        registry
            .register(Box::new(metric.clone()))
            .expect("letters_total is registered exactly once");
        metric
    }

    /// `metric` must be the vector returned by [`LetterCounter::metric`],
    /// registered once and shared across every file's `LetterCounter`.
    pub fn new(name: impl Into<String>, metric: &IntCounterVec) -> Self {
        LetterCounter {
            name: name.into(),
            metric: metric.clone(),
        }
    }
}

impl LineHandler for LetterCounter {
    fn process(&self, line: &str) {
        let mut upper = 0u64;
        let mut lower = 0u64;
        for ch in line.chars() {
            if ch.is_uppercase() {
                upper += 1;
            } else if ch.is_lowercase() {
                lower += 1;
            }
        }
        self.metric.with_label_values(&[&self.name, "upper"]).inc_by(upper);
        self.metric.with_label_values(&[&self.name, "lower"]).inc_by(lower);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn testcases(&self) -> Option<Vec<Testcase>> {
        // "AbC" -> upper A,C; lower b. "xyZ" -> upper Z; lower x,y.
        Some(vec![Testcase {
            name: "counts_mixed_case",
            input: &["AbC", "xyZ"],
            expect_contains: vec![
                format!("letters_total{{filename=\"{}\",lettertype=\"upper\"}} 3", self.name),
                format!("letters_total{{filename=\"{}\",lettertype=\"lower\"}} 3", self.name),
            ],
        }])
    }
}

/// Logs each line at `info`, truncated past `MAX_LINE_LENGTH` characters,
/// matching the original's `PrintingLineHandler.max_line_length`. Sets no
/// Prometheus metrics, matching the original's own docstring ("normally
/// you should... why else use this script").
pub struct PrintingLineHandler {
    name: String,
    seen: AtomicU64,
}

const MAX_LINE_LENGTH: usize = 100;

impl PrintingLineHandler {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        log::info!("printing all lines from {} on stdout", name);
        PrintingLineHandler { name, seen: AtomicU64::new(0) }
    }
}

impl LineHandler for PrintingLineHandler {
    fn process(&self, line: &str) {
        self.seen.fetch_add(1, Ordering::Relaxed);
        if line.chars().count() > MAX_LINE_LENGTH {
            let truncated: String = line.chars().take(MAX_LINE_LENGTH).collect();
            log::info!("{}: {}...", self.name, truncated);
        } else {
            log::info!("{}: {}", self.name, line);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn testcases(&self) -> Option<Vec<Testcase>> {
        // Matches the original's `testcases = False`: this handler sets no
        // metrics, so there's nothing to assert against.
        Some(vec![])
    }
}
