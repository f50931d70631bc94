// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Request-path resolution.
//!
//! Paths are sliced on `/` regardless of the host OS so traversal cannot
//! sneak in through backslashes; joining uses the native separator.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The path contains a NUL byte.
    BadRequest,
    /// Traversal attempt, unreadable entry, or a directory without index.
    Forbidden,
    /// No such file.
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Sanitized path relative to the root, always starting with `/`.
    pub logical_path: String,
    /// Filesystem path of the readable regular file to serve.
    pub file: PathBuf,
}

/// Map a request path onto a readable regular file under `root`.
///
/// Directories are retried against `index_files` in order. Every returned
/// file has passed an open-for-read probe.
pub fn resolve(root: &Path, index_files: &[String], path_info: &str) -> Result<Resolved, ResolveError> {
    if path_info.contains('\0') {
        return Err(ResolveError::BadRequest);
    }

    let segments = path_info
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    if segments.iter().any(|s| *s == "..") {
        return Err(ResolveError::Forbidden);
    }

    let mut file = root.to_path_buf();
    for segment in &segments {
        file.push(segment);
    }
    let logical_path = format!("/{}", segments.join("/"));
    debug_assert!(file.starts_with(root));

    let meta = match fs::metadata(&file) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ResolveError::Forbidden);
        }
        Err(_) => return Err(ResolveError::NotFound),
    };

    if meta.is_file() {
        return if readable(&file) {
            Ok(Resolved { logical_path, file })
        } else {
            Err(ResolveError::Forbidden)
        };
    }

    if meta.is_dir() {
        for name in index_files {
            let candidate = file.join(name);
            if candidate.is_file() && readable(&candidate) {
                let logical_path = if logical_path == "/" {
                    format!("/{name}")
                } else {
                    format!("{logical_path}/{name}")
                };
                return Ok(Resolved {
                    logical_path,
                    file: candidate,
                });
            }
        }
        return Err(ResolveError::Forbidden);
    }

    // Neither a regular file nor a directory (fifo, socket, ...).
    Err(ResolveError::Forbidden)
}

fn readable(path: &Path) -> bool {
    File::open(path).is_ok()
}
