//! Event Loop (spec.md §4.5): a `mio::Poll`-driven loop multiplexing the
//! Event Source's readiness fd and the HTTP listener's socket.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use mio::net::TcpListener;
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};

use crate::events::EventSource;
use crate::http;
use crate::metrics::MetricsRegistry;
use crate::tailer::TailingEngine;

const EVENT_SOURCE: Token = Token(0);
const HTTP_LISTENER: Token = Token(1);

/// Coarse poll timeout: exists only so operators can interrupt the loop,
/// never a correctness knob (spec.md §4.5).
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the event loop until `max_polls` iterations have elapsed (a
/// negative value runs forever), matching the original's `run_online`
/// condition `settings.max_polls <= 0 or loopcount < settings.max_polls`.
pub fn run<S: EventSource>(
    mut engine: TailingEngine<S>,
    mut listener: TcpListener,
    metrics: &MetricsRegistry,
    max_polls: i64,
) -> io::Result<()> {
    let mut poll = Poll::new()?;
    let event_source_fd: RawFd = engine.poll_fd();
    poll.registry()
        .register(&mut SourceFd(&event_source_fd), EVENT_SOURCE, Interest::READABLE)?;
    poll.registry()
        .register(&mut listener, HTTP_LISTENER, Interest::READABLE)?;

    let mut events = Events::with_capacity(16);
    let mut loopcount: i64 = 0;

    loop {
        if max_polls >= 0 && loopcount >= max_polls {
            break;
        }

        match poll.poll(&mut events, Some(POLL_TIMEOUT)) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }

        for event in events.iter() {
            match event.token() {
                EVENT_SOURCE => engine.tick(),
                HTTP_LISTENER => http::accept_and_serve(&listener, metrics),
                _ => unreachable!("no other tokens are registered"),
            }
        }

        metrics.inc_pollcount();
        loopcount += 1;
    }

    Ok(())
}
