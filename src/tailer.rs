//! Tailing Engine (spec.md §4.3): drives the per-path state machine, reads
//! newly appended bytes, splits them into lines, and dispatches to
//! handlers.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::TailError;
use crate::events::{EventKind, EventSource, PathEvent};
use crate::handler::{dispatch_line, LineHandler};
use crate::registry::{OpenFile, PathRegistry};

pub struct TailingEngine<S: EventSource> {
    source: S,
    registry: PathRegistry,
}

impl<S: EventSource> TailingEngine<S> {
    pub fn new(source: S) -> Self {
        TailingEngine {
            source,
            registry: PathRegistry::new(),
        }
    }

    /// spec.md §4.2: create or extend the `FileState` for `path`, then
    /// ensure watches are installed.
    pub fn register(&mut self, path: impl Into<PathBuf>, handler: Arc<dyn LineHandler>) {
        let path = path.into();
        self.registry.register(path.clone(), handler);
        self.attach(&path, false);
    }

    /// spec.md §4.5: drain the Event Source and apply each event in
    /// arrival order.
    pub fn tick(&mut self) {
        for event in self.source.drain() {
            self.apply(event);
        }
    }

    pub fn poll_fd(&self) -> std::os::unix::io::RawFd {
        self.source.poll_fd()
    }

    fn apply(&mut self, event: PathEvent) {
        if !self.registry.contains(&event.path) {
            log::debug!("ignoring event for unregistered path {}", event.path.display());
            return;
        }

        match event.kind {
            EventKind::Modify => {
                let attached = self.registry.get(&event.path).map(|s| s.is_attached()).unwrap_or(false);
                if attached {
                    self.read_and_dispatch(&event.path);
                } else {
                    log::debug!("ignoring MODIFY for detached path {}", event.path.display());
                }
            }
            EventKind::Create => {
                self.attach(&event.path, true);
                self.read_and_dispatch(&event.path);
            }
            EventKind::MovedIn => {
                self.attach(&event.path, false);
                self.read_and_dispatch(&event.path);
            }
            EventKind::MovedOut | EventKind::Deleted => {
                self.detach(&event.path);
            }
            EventKind::Ignored => {
                self.detach(&event.path);
                if event.path.exists() {
                    self.attach(&event.path, false);
                    self.read_and_dispatch(&event.path);
                }
            }
        }
    }

    /// Idempotently installs the file-level watch (if absent), the parent
    /// directory watch (if absent), and opens the file if it isn't already
    /// open. Re-entering `attach` on an already-attached path is a no-op
    /// for the open handle, so that a second handler registering on a
    /// live path, or a duplicate CREATE/MOVED_IN, never discards the
    /// current cursor (spec.md "Idempotent attach").
    fn attach(&mut self, path: &Path, from_start: bool) {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if let Err(err) = self.source.install_dir_watch(&parent) {
            log::info!("non-fatal: failed to watch directory {}: {}", parent.display(), err);
        }

        let needs_file_watch = self
            .registry
            .get(path)
            .map(|state| state.watch_id.is_none())
            .unwrap_or(false);

        if needs_file_watch {
            match self.source.install_file_watch(path) {
                Ok(wd) => {
                    if let Some(state) = self.registry.get_mut(path) {
                        state.watch_id = Some(wd);
                    }
                }
                Err(err) => {
                    let err = TailError::WatchInstallFailed { path: path.to_path_buf(), source: err };
                    log::info!("{}", err);
                }
            }
        }

        let already_attached = self.registry.get(path).map(|s| s.is_attached()).unwrap_or(false);
        if !already_attached {
            self.reopen(path, from_start);
        }
    }

    fn reopen(&mut self, path: &Path, from_start: bool) {
        let state = match self.registry.get_mut(path) {
            Some(s) => s,
            None => return,
        };

        state.open = None;
        state.carry.clear();

        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(_) => {
                // Doesn't exist yet; the directory watch will notice its
                // creation later.
                return;
            }
        };

        let seek_to = if from_start { SeekFrom::Start(0) } else { SeekFrom::End(0) };
        match file.seek(seek_to) {
            Ok(cursor) => state.open = Some(OpenFile { handle: file, cursor }),
            Err(err) => log::warn!("failed to seek {}: {}", path.display(), err),
        }
    }

    fn detach(&mut self, path: &Path) {
        self.source.remove_file_watch(path);
        if let Some(state) = self.registry.get_mut(path) {
            state.watch_id = None;
            state.open = None;
            state.carry.clear();
        }
    }

    /// spec.md §4.3 "Read-and-dispatch".
    fn read_and_dispatch(&mut self, path: &Path) {
        let mut chunk = Vec::new();
        let mut truncated = false;

        {
            let state = match self.registry.get_mut(path) {
                Some(s) => s,
                None => return,
            };
            let open = match state.open.as_mut() {
                Some(o) => o,
                None => return,
            };

            let file_size = match open.handle.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    log::warn!("{}", TailError::TransientIo { path: path.to_path_buf(), source: err });
                    return;
                }
            };

            if file_size < open.cursor {
                log::info!("file {} was truncated, seeking to beginning of file", path.display());
                if let Err(err) = open.handle.seek(SeekFrom::Start(0)) {
                    log::warn!("{}", TailError::TransientIo { path: path.to_path_buf(), source: err });
                    return;
                }
                open.cursor = 0;
                truncated = true;
            }

            if let Err(err) = open.handle.read_to_end(&mut chunk) {
                log::warn!("{}", TailError::TransientIo { path: path.to_path_buf(), source: err });
                return;
            }

            open.cursor = match open.handle.stream_position() {
                Ok(pos) => pos,
                Err(err) => {
                    log::warn!("{}", TailError::TransientIo { path: path.to_path_buf(), source: err });
                    return;
                }
            };
        }

        let state = self.registry.get_mut(path).expect("checked above");
        if truncated {
            state.carry.clear();
        }

        let mut combined = std::mem::take(&mut state.carry);
        combined.extend_from_slice(&chunk);

        let lines: Vec<Vec<u8>> = match combined.iter().rposition(|&b| b == b'\n') {
            Some(last_nl) => {
                let segment = &combined[..last_nl];
                let carry = combined[last_nl + 1..].to_vec();
                let lines = segment.split(|&b| b == b'\n').map(|s| s.to_vec()).collect();
                state.carry = carry;
                lines
            }
            None => {
                state.carry = combined;
                Vec::new()
            }
        };

        let handlers = state.handlers.clone();
        for line_bytes in lines {
            let line = String::from_utf8_lossy(&line_bytes).into_owned();
            dispatch_line(&handlers, &line);
        }
    }
}
