//! HTTP Exposition Server (spec.md §4.6): a minimal, hand-rolled HTTP/1.1
//! responder over `mio::net`, generalizing the original's
//! `MoreRobustHTTPServer` / `MoreSilentMetricsHandler` without pulling in an
//! async runtime (spec.md §5's single-threaded cooperative model).

use std::io::{self, Read, Write};

use mio::net::{TcpListener, TcpStream};

use crate::metrics::MetricsRegistry;

/// Accepts every pending connection on `listener` and serves each to
/// completion before returning. Connections are short-lived (one
/// request/response, then close), so there's no need to track partially
/// read/written streams across ticks.
pub fn accept_and_serve(listener: &TcpListener, metrics: &MetricsRegistry) {
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => serve_one(stream, metrics),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
            Err(err) => {
                log::info!("error accepting HTTP connection: {}", err);
                break;
            }
        }
    }
}

fn serve_one(mut stream: TcpStream, metrics: &MetricsRegistry) {
    let mut buf = [0u8; 4096];
    let n = match read_request_line(&mut stream, &mut buf) {
        Ok(n) => n,
        Err(err) => {
            log::info!("error reading HTTP request: {}", err);
            return;
        }
    };

    let request = String::from_utf8_lossy(&buf[..n]);
    let first_line = request.lines().next().unwrap_or("");
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");

    let response = if method != "GET" {
        respond(405, "text/plain", "method not allowed\n")
    } else if path == "/metrics" || path == "/" {
        let body = metrics.gather_text();
        respond(200, "text/plain; version=0.0.4", &body)
    } else {
        respond(404, "text/plain", "not found\n")
    };

    let status = response.status;
    if let Err(err) = stream.write_all(response.bytes.as_slice()) {
        log::info!("error writing HTTP response: {}", err);
        return;
    }

    // Matches `MoreSilentMetricsHandler`: 200s are never logged, anything
    // else is.
    if status != 200 {
        log::info!("HTTP {} {} -> {}", method, path, status);
    }
}

/// Blocking-free best-effort read of the request line and headers. The
/// server never needs the body (GET-only endpoints), so one `read` call is
/// enough in practice; a short read just means we saw an empty method/path,
/// which falls through to the 405/404 paths harmlessly.
fn read_request_line(stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<usize> {
    match stream.read(buf) {
        Ok(n) => Ok(n),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(0),
        Err(err) => Err(err),
    }
}

struct Response {
    status: u16,
    bytes: Vec<u8>,
}

fn respond(status: u16, content_type: &str, body: &str) -> Response {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        content_type,
        body.len()
    );
    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body.as_bytes());
    Response { status, bytes }
}
