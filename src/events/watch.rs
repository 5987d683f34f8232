//! Watch masks and descriptors.
//!
//! Grounded on the teacher crate's `watches.rs`: a `bitflags!` mask type that
//! mirrors the `IN_*` constants, and a `WatchDescriptor` identifying a live
//! kernel watch. Unlike the teacher crate, which exposes the full inotify
//! mask vocabulary for general use, this module only exposes the two masks
//! the tailing engine actually installs (spec.md 4.1): file-level watches
//! request `MODIFY` only, directory-level watches request
//! `CREATE | MOVED_IN | MOVED_OUT | DELETED`.

use std::os::raw::c_int;

bitflags::bitflags! {
    /// Describes what a watch should fire on.
    #[derive(PartialEq, Eq, Clone, Copy, Debug)]
    pub struct WatchMask: u32 {
        const MODIFY    = inotify_sys::IN_MODIFY;
        const CREATE    = inotify_sys::IN_CREATE;
        const MOVED_TO  = inotify_sys::IN_MOVED_TO;
        const MOVED_FROM = inotify_sys::IN_MOVED_FROM;
        const DELETE    = inotify_sys::IN_DELETE;
        const IGNORED   = inotify_sys::IN_IGNORED;
    }
}

impl WatchMask {
    /// Mask installed on a file-level watch: `MODIFY` only.
    pub fn file() -> Self {
        WatchMask::MODIFY
    }

    /// Mask installed on a directory-level watch.
    pub fn directory() -> Self {
        WatchMask::CREATE | WatchMask::MOVED_TO | WatchMask::MOVED_FROM | WatchMask::DELETE
    }
}

/// Identifies a live watch installed on the kernel's watch list.
///
/// Opaque outside this module; equality is by the raw watch descriptor the
/// kernel returned from `inotify_add_watch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchDescriptor(pub(crate) c_int);
