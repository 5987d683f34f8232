//! Mirrors `original_source/program_example.py`: a fixed set of demo
//! handlers wired to a fixed set of log files, run to completion.

use std::sync::Arc;

use mio::net::TcpListener;

use logtail_exporter::demo_handlers::{LetterCounter, LineCounter, PrintingLineHandler};
use logtail_exporter::event_loop;
use logtail_exporter::events::InotifyEventSource;
use logtail_exporter::metrics::MetricsRegistry;
use logtail_exporter::tailer::TailingEngine;

fn main() {
    env_logger::init();

    let metrics = MetricsRegistry::new();
    let line_counter_metric = LineCounter::metric(metrics.registry());
    let letter_counter_metric = LetterCounter::metric(metrics.registry());
    let source = InotifyEventSource::init().expect("inotify unavailable");
    let mut engine = TailingEngine::new(source);

    engine.register(
        "/var/log/syslog",
        Arc::new(LineCounter::new("/var/log/syslog", &line_counter_metric)),
    );
    engine.register(
        "/var/log/syslog",
        Arc::new(LetterCounter::new("/var/log/syslog", &letter_counter_metric)),
    );
    engine.register(
        "/var/log/syslog",
        Arc::new(PrintingLineHandler::new("/var/log/syslog")),
    );
    engine.register(
        "/var/log/auth.log",
        Arc::new(LineCounter::new("/var/log/auth.log", &line_counter_metric)),
    );

    let listener = TcpListener::bind("0.0.0.0:9123".parse().unwrap()).expect("failed to bind HTTP listener");

    event_loop::run(engine, listener, &metrics, -1).expect("event loop terminated");
}
