// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Content-type and cache-policy selection for a resolved file.

use std::path::Path;

use crate::config::Config;
use crate::extensions::PathExt;

pub const NO_STORE: &str = "no-store";

#[derive(Debug, PartialEq)]
pub struct Policy {
    /// Media type without parameters; charset is appended at build time.
    pub content_type: String,
    /// Dot-prefixed extension (`".css"`), or empty when the name has none.
    pub extension: String,
    /// Validity window in seconds; negative means "already expired".
    pub valid_for: i64,
    pub cache_control: Vec<String>,
    pub should_etag: bool,
}

/// Pick media type and cache policy for a file.
///
/// Content type precedence: configured override for the extension, then the
/// MIME table, then `text/plain`. Cache policy starts from the configured
/// defaults and is overridden per extension; `max-age` is prepended unless
/// the final directives carry `no-store`.
pub fn select(config: &Config, file: &Path) -> Policy {
    let name = file.filename_str();
    let extension = name
        .rfind('.')
        .map(|dot| name[dot..].to_owned())
        .unwrap_or_default();
    let rule = config.types.get(&extension);

    let content_type = rule
        .and_then(|rule| rule.content_type.clone())
        .or_else(|| file.mime().map(|mime| mime.essence_str().to_owned()))
        .unwrap_or_else(|| "text/plain".to_owned());

    let valid_for = rule
        .and_then(|rule| rule.valid_for)
        .unwrap_or(config.defaults.valid_for);
    let mut cache_control = rule
        .and_then(|rule| rule.cache_control.clone())
        .unwrap_or_else(|| config.defaults.cache_control.clone());

    let no_store = cache_control.iter().any(|d| d == NO_STORE);
    let should_etag = config.defaults.etag && !no_store;
    if !no_store {
        cache_control.insert(0, format!("max-age={valid_for}"));
    }

    Policy {
        content_type,
        extension,
        valid_for,
        cache_control,
        should_etag,
    }
}
