use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use mio::net::TcpListener;

use logtail_exporter::cli::{self, Config, TestMode};
use logtail_exporter::demo_handlers::{LetterCounter, LineCounter, PrintingLineHandler};
use logtail_exporter::error::ConfigError;
use logtail_exporter::event_loop;
use logtail_exporter::events::InotifyEventSource;
use logtail_exporter::handler::{run_handler_tests, LineHandler};
use logtail_exporter::metrics::MetricsRegistry;
use logtail_exporter::tailer::TailingEngine;

/// `run_offline`'s `NotImplementedError` realized as a `ConfigurationError`
/// that aborts before any tailing starts (spec.md §7).
fn check_offline(config: &Config) -> Result<(), ConfigError> {
    if config.offline {
        return Err(ConfigError::OfflineNotImplemented);
    }
    Ok(())
}

fn main() -> ExitCode {
    let config = Config::parse();
    cli::init_logging(&config);

    if let Err(err) = check_offline(&config) {
        log::error!("{}", err);
        return ExitCode::from(9);
    }

    let metrics = MetricsRegistry::new();
    let line_counter_metric = LineCounter::metric(metrics.registry());
    let letter_counter_metric = LetterCounter::metric(metrics.registry());

    let mut handlers_by_file: Vec<(std::path::PathBuf, Vec<Arc<dyn LineHandler>>)> = Vec::new();
    for path in &config.files {
        let label = path.display().to_string();
        let handlers: Vec<Arc<dyn LineHandler>> = vec![
            Arc::new(LineCounter::new(label.clone(), &line_counter_metric)),
            Arc::new(LetterCounter::new(label.clone(), &letter_counter_metric)),
            Arc::new(PrintingLineHandler::new(label)),
        ];
        handlers_by_file.push((path.clone(), handlers));
    }

    if config.testcases != TestMode::Skip {
        let all_handlers: Vec<Arc<dyn LineHandler>> = handlers_by_file
            .iter()
            .flat_map(|(_, handlers)| handlers.iter().cloned())
            .collect();
        let (failures, errors) = run_handler_tests(&all_handlers, &metrics);
        log::info!("testcases: {} failures, {} errors", failures, errors);

        let failed = failures > 0 || errors > 0;
        match config.testcases {
            TestMode::Strict if failed => {
                log::error!("{}", ConfigError::TestcasesFailed);
                return ExitCode::from(9);
            }
            TestMode::RunThenQuit => {
                return ExitCode::from(if failed { 9 } else { 0 });
            }
            _ => {}
        }
    }

    let source = match InotifyEventSource::init() {
        Ok(source) => source,
        Err(err) => {
            log::error!("failed to initialize inotify: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let mut engine = TailingEngine::new(source);
    for (path, handlers) in handlers_by_file {
        for handler in handlers {
            engine.register(path.clone(), handler);
        }
    }

    let addr = format!("0.0.0.0:{}", config.port).parse().expect("valid socket address");
    let listener = match TcpListener::bind(addr) {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("failed to bind HTTP listener on port {}: {}", config.port, err);
            return ExitCode::FAILURE;
        }
    };

    log::info!("listening on {}", addr);
    if let Err(err) = event_loop::run(engine, listener, &metrics, config.max_polls) {
        log::error!("event loop terminated: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
