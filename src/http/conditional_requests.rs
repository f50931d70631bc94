// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::time::SystemTime;

use hyper::header::HeaderValue;

use crate::extensions::SystemTimeExt;

/// Evaluate an `If-Modified-Since` header field against the mtime of the
/// representation about to be served.
///
/// Some agents append a `; length=...` hint to the date, so everything from
/// the first `;` on is dropped before parsing. Comparison is done on whole
/// seconds since HTTP-dates carry no finer resolution. A value that fails
/// to parse never matches.
pub fn is_unmodified_since(if_modified_since: &HeaderValue, mtime: SystemTime) -> bool {
    let value = match if_modified_since.to_str() {
        Ok(value) => value,
        Err(_) => return false,
    };
    let date = value.split(';').next().unwrap_or_default().trim();
    match httpdate::parse_http_date(date) {
        Ok(since) => mtime.timestamp_sec() <= since.timestamp_sec(),
        Err(_) => false,
    }
}

/// Evaluate an `If-None-Match` header field against the stored entity tag.
///
/// Tags are compared literally. The on-disk tag format is an unquoted hex
/// triple, so no weak/strong or quoted-form handling applies.
pub fn matches_etag(if_none_match: &HeaderValue, etag: &str) -> bool {
    if_none_match
        .to_str()
        .map(|value| value.trim() == etag)
        .unwrap_or(false)
}


#[cfg(test)]
mod t_matches_etag {
    use super::*;

    #[test]
    fn literal_equality() {
        let value = HeaderValue::from_static("ab12-5f-3c");
        assert!(matches_etag(&value, "ab12-5f-3c"));
        assert!(!matches_etag(&value, "ab12-5f-3d"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let value = HeaderValue::from_static("  ab12-5f-3c ");
        assert!(matches_etag(&value, "ab12-5f-3c"));
    }

    #[test]
    fn quoted_form_is_a_different_tag() {
        let value = HeaderValue::from_static("\"ab12-5f-3c\"");
        assert!(!matches_etag(&value, "ab12-5f-3c"));
    }
}
