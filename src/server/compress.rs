// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compressed-sibling selection under weighted `Accept-Encoding`.
//!
//! Codings are tried in the client's preference order; the first one with a
//! fresh sidecar, or for which a sidecar can be produced, wins. Compressed
//! siblings attach to whatever file is currently selected, so a minified
//! substitution earlier in the pipeline yields `*.min.css.gz` on disk.

use std::fs;
use std::io;
use std::path::Path;

use hyper::header::HeaderValue;
use tracing::warn;

use crate::config::Config;
use crate::extensions::PathExt;
use crate::http::content_encoding::{self, DEFLATE, GZIP, ZSTD};
use crate::server::sidecar::{self, Probe};
use crate::server::Representation;

/// Suffix table. `deflate` keeps its historical `.zip` suffix for on-disk
/// compatibility with existing caches.
const CODINGS: &[(&str, &str)] = &[(GZIP, ".gz"), (DEFLATE, ".zip"), (ZSTD, ".zstd")];

/// Substitute `current_file` with a compressed sibling acceptable to the
/// client. `identity`, `*`, and codings this build cannot produce are
/// skipped; a coding that fails to generate logs a warning and falls
/// through to the next one.
pub fn apply(config: &Config, rep: &mut Representation, accept_encoding: Option<&HeaderValue>) {
    if !config.defaults.compress {
        return;
    }
    let header = match accept_encoding.and_then(|value| value.to_str().ok()) {
        Some(header) => header,
        None => return,
    };

    for name in content_encoding::ranked_encodings(header) {
        let (coding, suffix) = match lookup(config, name) {
            Some(entry) => entry,
            None => continue,
        };
        let source_mtime = match rep.current_file.mtime() {
            Some(mtime) => mtime,
            None => return,
        };
        let candidate = sidecar::suffixed(&rep.current_file, suffix);

        if let Probe::Fresh = sidecar::probe(&candidate, source_mtime) {
            rep.current_file = candidate;
            rep.content_encoding = Some(coding);
            return;
        }

        match generate(&rep.current_file, &candidate, coding) {
            Ok(()) => {
                rep.current_file = candidate;
                rep.content_encoding = Some(coding);
                return;
            }
            Err(err) => {
                warn!(
                    "Failed compressing {} with {}: {}",
                    rep.current_file.display(),
                    coding,
                    err,
                );
            }
        }
    }
}

fn lookup(config: &Config, name: &str) -> Option<(&'static str, &'static str)> {
    CODINGS
        .iter()
        .find(|(coding, _)| *coding == name && config.compressors.contains(coding))
        .copied()
}

fn generate(source: &Path, candidate: &Path, coding: &str) -> io::Result<()> {
    let data = fs::read(source)?;
    let compressed = content_encoding::encode(&data, coding)?;
    sidecar::write_locked(candidate, &compressed)
}
