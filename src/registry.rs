//! Path Registry (spec.md §4.2 / §3): the in-memory map from watched path to
//! its tailing state, and from watched directory to the set of registered
//! children.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::events::WatchDescriptor;
use crate::handler::LineHandler;

/// An open inotify-watched file and the byte cursor into it.
///
/// `handle` present implies `cursor` is meaningful and equal to the file's
/// current read position; there is no separate sentinel value for "no
/// handle" the way spec.md's `cursor = -1` is — that state is `FileState
/// .open` being `None` instead, which is the idiomatic strengthening the
/// source's own mixed char/byte cursor bug (spec.md §9) is corrected by.
pub struct OpenFile {
    pub handle: File,
    pub cursor: u64,
}

/// Per-path tailing state. One instance per registered path, for the
/// lifetime of the process; `handle`/`watch_id` cycle across rotations but
/// `handlers` persists.
pub struct FileState {
    pub path: PathBuf,
    pub watch_id: Option<WatchDescriptor>,
    pub open: Option<OpenFile>,
    pub carry: Vec<u8>,
    pub handlers: Vec<Arc<dyn LineHandler>>,
}

impl FileState {
    fn new(path: PathBuf, handler: Arc<dyn LineHandler>) -> Self {
        FileState {
            path,
            watch_id: None,
            open: None,
            carry: Vec::new(),
            handlers: vec![handler],
        }
    }

    pub fn is_attached(&self) -> bool {
        self.open.is_some()
    }
}

/// The set of registered paths living directly inside one directory.
#[derive(Default)]
pub struct DirState {
    pub directory: PathBuf,
    pub members: Vec<PathBuf>,
}

/// Owns every `FileState`/`DirState` for the life of the process.
#[derive(Default)]
pub struct PathRegistry {
    files: HashMap<PathBuf, FileState>,
    dirs: HashMap<PathBuf, DirState>,
}

impl PathRegistry {
    pub fn new() -> Self {
        PathRegistry {
            files: HashMap::new(),
            dirs: HashMap::new(),
        }
    }

    /// Registers `handler` for `path`. If `path` is already registered, the
    /// handler is appended (never deduplicated) rather than replacing the
    /// existing `FileState`.
    pub fn register(&mut self, path: PathBuf, handler: Arc<dyn LineHandler>) {
        self.files
            .entry(path.clone())
            .and_modify(|state| state.handlers.push(handler.clone()))
            .or_insert_with(|| FileState::new(path.clone(), handler));

        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let dir = self.dirs.entry(parent.clone()).or_insert_with(|| DirState {
            directory: parent.clone(),
            members: Vec::new(),
        });
        if !dir.members.contains(&path) {
            dir.members.push(path);
        }
    }

    pub fn get(&self, path: &Path) -> Option<&FileState> {
        self.files.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut FileState> {
        self.files.get_mut(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn dir_state(&self, dir: &Path) -> Option<&DirState> {
        self.dirs.get(dir)
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    pub fn directories(&self) -> impl Iterator<Item = &PathBuf> {
        self.dirs.keys()
    }
}
