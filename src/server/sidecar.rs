// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Derived-file plumbing shared by the minifier, the compressor and the
//! ETag store: freshness probing against the source mtime, and reads and
//! writes serialized through advisory file locks.
//!
//! Locks are advisory only between cooperating server processes. Readers
//! take a shared lock, writers an exclusive one; a writer truncates after
//! acquiring the lock so a concurrent reader never observes a torn file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fs2::FileExt;

#[derive(Debug, PartialEq)]
pub enum Probe {
    /// The sidecar exists and is at least as new as its source.
    Fresh,
    /// No usable sidecar. A stale one has already been unlinked.
    Missing,
}

/// Check a sidecar candidate against the mtime of the file it derives from.
/// A candidate is stale when the source is strictly newer; stale candidates
/// are deleted so the caller regenerates them.
pub fn probe(candidate: &Path, source_mtime: SystemTime) -> Probe {
    let mtime = fs::metadata(candidate).and_then(|meta| meta.modified());
    match mtime {
        Ok(mtime) if source_mtime > mtime => {
            let _ = fs::remove_file(candidate);
            Probe::Missing
        }
        Ok(_) => Probe::Fresh,
        Err(_) => Probe::Missing,
    }
}

/// Append a sidecar suffix (`.gz`, `.etag`, ...) to a file name.
pub fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Write a sidecar under an exclusive advisory lock.
///
/// The file is truncated only after the lock is held: two racing writers
/// serialize, the last one wins, and shared-lock readers never see a
/// half-written sidecar.
pub fn write_locked(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = OpenOptions::new().write(true).create(true).open(path)?;
    file.lock_exclusive()?;
    let result = write_contents(&file, bytes);
    let _ = file.unlock();
    result
}

fn write_contents(mut file: &File, bytes: &[u8]) -> io::Result<()> {
    file.set_len(0)?;
    file.write_all(bytes)?;
    file.flush()
}

/// Read the first line of a sidecar under a shared advisory lock, with the
/// trailing newline trimmed.
pub fn read_line_locked(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    file.lock_shared()?;
    let mut line = String::new();
    let result = BufReader::new(&file).read_line(&mut line);
    let _ = file.unlock();
    result?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}
