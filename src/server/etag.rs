// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Durable entity tags, one `.etag` sidecar per representation.
//!
//! The tag is the hex triple `<inode>-<mtime>-<size>` of the exact file
//! being served, so a minified or compressed sibling carries its own tag.
//! Tags are strong: the server owns both the source lifecycle and the
//! derived-artifact lifecycle, so same-second rewrites that would motivate
//! a weak tag do not arise.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::warn;

use crate::extensions::SystemTimeExt;
use crate::server::sidecar::{self, Probe};

/// Read a fresh `.etag` sidecar for `file`, or materialize one.
///
/// Returns `None` when no tag can be obtained; the response then simply
/// omits the header.
pub fn load_or_create(file: &Path) -> Option<String> {
    let sidecar_path = sidecar::suffixed(file, ".etag");
    let meta = fs::metadata(file).ok()?;
    let mtime = meta.modified().ok()?;

    if let Probe::Fresh = sidecar::probe(&sidecar_path, mtime) {
        return match sidecar::read_line_locked(&sidecar_path) {
            Ok(tag) => Some(tag),
            Err(_) => {
                warn!("Can't open {} for reading", sidecar_path.display());
                None
            }
        };
    }

    let tag = format_tag(&meta, mtime);
    match sidecar::write_locked(&sidecar_path, format!("{tag}\n").as_bytes()) {
        Ok(()) => Some(tag),
        Err(_) => {
            warn!("Can't open {} for writing", sidecar_path.display());
            None
        }
    }
}

fn format_tag(meta: &fs::Metadata, mtime: SystemTime) -> String {
    format!("{:x}-{:x}-{:x}", inode(meta), mtime.timestamp_sec(), meta.len())
}

#[cfg(unix)]
fn inode(meta: &fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn inode(_meta: &fs::Metadata) -> u64 {
    0
}
