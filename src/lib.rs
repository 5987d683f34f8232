//! `logtail-exporter`: a rotation-resilient log-tailing metrics exporter.
//!
//! Watches a set of text log files via Linux `inotify(7)`, delivers newly
//! appended lines to user-supplied [`handler::LineHandler`]s that maintain
//! metric counters/gauges, and exposes those metrics over HTTP in the
//! Prometheus text exposition format.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use logtail_exporter::demo_handlers::LineCounter;
//! use logtail_exporter::events::InotifyEventSource;
//! use logtail_exporter::metrics::MetricsRegistry;
//! use logtail_exporter::tailer::TailingEngine;
//!
//! let metrics = MetricsRegistry::new();
//! let source = InotifyEventSource::init().expect("inotify unavailable");
//! let mut engine = TailingEngine::new(source);
//! let handler = Arc::new(LineCounter::new("syslog", metrics.registry()));
//! engine.register("/var/log/syslog", handler);
//! ```

pub mod cli;
pub mod demo_handlers;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod handler;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod tailer;
