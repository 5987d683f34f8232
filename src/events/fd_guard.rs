//! RAII ownership of a raw inotify file descriptor.
//!
//! Grounded on the teacher crate's `FdGuard`: the fd is closed exactly once,
//! on drop. `Inotify` holds this behind an `Arc` so that outstanding
//! `Events<'a>` borrows and the `EventSource` trait object can share it
//! without a destructor racing the reader.

use std::os::unix::io::RawFd;

#[derive(Debug)]
pub struct FdGuard {
    pub fd: RawFd,
}

impl FdGuard {
    pub fn new(fd: RawFd) -> Self {
        FdGuard { fd }
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        unsafe {
            inotify_sys::close(self.fd);
        }
    }
}

impl PartialEq for FdGuard {
    fn eq(&self, other: &Self) -> bool {
        self.fd == other.fd
    }
}

impl std::ops::Deref for FdGuard {
    type Target = RawFd;

    fn deref(&self) -> &RawFd {
        &self.fd
    }
}
