//! Real inotify-backed `EventSource`.
//!
//! Directly descended from the teacher crate's `Inotify` (non-blocking,
//! `IN_CLOEXEC | IN_NONBLOCK` init, raw `read()` into a byte buffer, manual
//! `inotify_event` parsing) with the addition of the wd -> path bookkeeping
//! spec.md §4.1 requires, since the kernel only ever gives us a watch
//! descriptor and an optional relative name.

use std::collections::HashMap;
use std::ffi::{CString, OsStr};
use std::io;
use std::mem;
use std::os::raw::c_int;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use super::fd_guard::FdGuard;
use super::watch::WatchMask;
use super::{EventKind, EventSource, PathEvent, WatchDescriptor};

#[derive(Debug, Clone)]
enum WatchKind {
    File(PathBuf),
    Dir(PathBuf),
}

pub struct InotifyEventSource {
    fd: FdGuard,
    file_watches: HashMap<PathBuf, c_int>,
    dir_watches: HashMap<PathBuf, c_int>,
    wd_to_entry: HashMap<c_int, WatchKind>,
    buffer: Vec<u8>,
}

/// Large enough for many simultaneously-queued events with reasonably long
/// filenames; `drain` loops `read()` until `EAGAIN`, so this is a throughput
/// knob, not a correctness one.
const BUFFER_SIZE: usize = 16 * 1024;

impl InotifyEventSource {
    pub fn init() -> io::Result<Self> {
        let fd = unsafe { inotify_sys::inotify_init1(inotify_sys::IN_CLOEXEC | inotify_sys::IN_NONBLOCK) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        Ok(InotifyEventSource {
            fd: FdGuard::new(fd),
            file_watches: HashMap::new(),
            dir_watches: HashMap::new(),
            wd_to_entry: HashMap::new(),
            buffer: vec![0; BUFFER_SIZE],
        })
    }

    fn add_watch(&self, path: &Path, mask: WatchMask) -> io::Result<c_int> {
        let cpath = CString::new(path.as_os_str().as_bytes())?;
        let wd = unsafe { inotify_sys::inotify_add_watch(self.fd.fd, cpath.as_ptr(), mask.bits()) };
        if wd == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(wd)
    }

    fn rm_watch(&self, wd: c_int) {
        unsafe {
            inotify_sys::inotify_rm_watch(self.fd.fd, wd);
        }
    }

    /// Translates one raw `IN_*` mask into the event kinds the Tailing
    /// Engine understands. A single raw event only ever matches one of
    /// these for the masks we install, but the match stays a loop-friendly
    /// `Vec` push rather than an early return in case that changes.
    fn kinds_for_mask(mask: u32) -> Vec<EventKind> {
        let mut kinds = Vec::with_capacity(1);
        if mask & inotify_sys::IN_MODIFY != 0 {
            kinds.push(EventKind::Modify);
        }
        if mask & inotify_sys::IN_CREATE != 0 {
            kinds.push(EventKind::Create);
        }
        if mask & inotify_sys::IN_MOVED_TO != 0 {
            kinds.push(EventKind::MovedIn);
        }
        if mask & inotify_sys::IN_MOVED_FROM != 0 {
            kinds.push(EventKind::MovedOut);
        }
        if mask & inotify_sys::IN_DELETE != 0 {
            kinds.push(EventKind::Deleted);
        }
        if mask & inotify_sys::IN_IGNORED != 0 {
            kinds.push(EventKind::Ignored);
        }
        kinds
    }
}

impl EventSource for InotifyEventSource {
    fn install_file_watch(&mut self, path: &Path) -> io::Result<WatchDescriptor> {
        if let Some(wd) = self.file_watches.get(path) {
            return Ok(WatchDescriptor(*wd));
        }
        let wd = self.add_watch(path, WatchMask::file())?;
        self.file_watches.insert(path.to_path_buf(), wd);
        self.wd_to_entry.insert(wd, WatchKind::File(path.to_path_buf()));
        Ok(WatchDescriptor(wd))
    }

    fn install_dir_watch(&mut self, dir: &Path) -> io::Result<WatchDescriptor> {
        if let Some(wd) = self.dir_watches.get(dir) {
            return Ok(WatchDescriptor(*wd));
        }
        let wd = self.add_watch(dir, WatchMask::directory())?;
        self.dir_watches.insert(dir.to_path_buf(), wd);
        self.wd_to_entry.insert(wd, WatchKind::Dir(dir.to_path_buf()));
        Ok(WatchDescriptor(wd))
    }

    fn remove_file_watch(&mut self, path: &Path) {
        if let Some(wd) = self.file_watches.remove(path) {
            self.rm_watch(wd);
            self.wd_to_entry.remove(&wd);
        }
    }

    fn poll_fd(&self) -> RawFd {
        self.fd.fd
    }

    fn drain(&mut self) -> Vec<PathEvent> {
        let mut events = Vec::new();

        loop {
            let n = unsafe {
                inotify_sys::read(
                    self.fd.fd,
                    self.buffer.as_mut_ptr() as *mut libc::c_void,
                    self.buffer.len(),
                )
            };

            if n == 0 {
                break;
            }
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::WouldBlock {
                    log::warn!("inotify read failed: {}", err);
                }
                break;
            }

            let n = n as usize;
            let mut pos = 0;
            let event_size = mem::size_of::<inotify_sys::inotify_event>();

            while pos + event_size <= n {
                let raw = unsafe {
                    (self.buffer[pos..].as_ptr() as *const inotify_sys::inotify_event).read_unaligned()
                };
                let name_len = raw.len as usize;
                let name_start = pos + event_size;
                let name_end = name_start + name_len;
                let name_bytes = &self.buffer[name_start..name_end];
                let name = name_bytes
                    .splitn(2, |b| *b == 0u8)
                    .next()
                    .unwrap_or(&[]);

                if let Some(entry) = self.wd_to_entry.get(&raw.wd) {
                    let path = match entry {
                        WatchKind::File(p) => p.clone(),
                        WatchKind::Dir(dir) => {
                            if name.is_empty() {
                                dir.clone()
                            } else {
                                dir.join(OsStr::from_bytes(name))
                            }
                        }
                    };

                    for kind in Self::kinds_for_mask(raw.mask) {
                        events.push(PathEvent {
                            kind,
                            path: path.clone(),
                        });
                    }
                } else {
                    log::debug!("event for unknown watch descriptor {}", raw.wd);
                }

                pos = name_end;
            }
        }

        events
    }
}
