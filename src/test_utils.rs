// Copyright (c) 2020 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Helpers for building throwaway file trees. The pipeline writes sidecars
//! next to whatever it serves, so every test gets its own temp root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::server::Representation;

pub fn temp_root() -> TempDir {
    tempfile::Builder::new()
        .prefix(concat!(env!("CARGO_PKG_NAME"), "-test"))
        .tempdir()
        .unwrap()
}

/// Write a file under `root`, creating intermediate directories.
pub fn write_file(root: &Path, rel: &str, contents: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Push a file's mtime `secs` into the past, for freshness tests.
pub fn backdate(path: &Path, secs: u64) {
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(secs))
        .unwrap();
}

/// A pipeline value as it looks right after type/policy selection.
pub fn rep_for(file: &Path, root: &Path, content_type: &str) -> Representation {
    let rel = file.strip_prefix(root).unwrap();
    let name = file.file_name().unwrap().to_str().unwrap();
    Representation {
        logical_path: format!("/{}", rel.to_str().unwrap().replace('\\', "/")),
        current_file: file.to_owned(),
        content_type: content_type.to_owned(),
        extension: name.rfind('.').map(|dot| name[dot..].to_owned()).unwrap_or_default(),
        valid_for: 86_400,
        cache_control: vec!["max-age=86400".to_owned(), "public".to_owned()],
        should_etag: true,
        content_encoding: None,
        etag: None,
    }
}
