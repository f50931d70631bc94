// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, BufReader};

use flate2::read::{GzEncoder, ZlibEncoder};
use flate2::Compression;

pub const GZIP: &str = "gzip";
pub const DEFLATE: &str = "deflate";
pub const ZSTD: &str = "zstd";

/// Inner helper type to store quality values.
///
/// - 0: content coding
/// - 1: weight from 0 to 1000
#[derive(Debug, PartialEq)]
struct QualityValue<'a>(&'a str, u32);

/// According to RFC7231, a [Quality Values][1] is defined as follow grammar:
///
/// ```text
/// weight = OWS ";" OWS "q=" qvalue
/// qvalue = ( "0" [ "." 0*3DIGIT ] )
///        / ( "1" [ "." 0*3("0") ] )
/// ```
///
/// Note that:
///
/// - Quality value of 0 means unacceptable.
/// - The weight ranges from 0 to 1 in real number with three digit at most.
/// - Weight defaults to 1 if not present.
/// - We define unrecognized qvalue as zero.
///
/// [1]: https://tools.ietf.org/html/rfc7231#section-5.3.1
fn parse_qvalue(q: &str) -> Option<QualityValue> {
    let mut iter = q.trim().split_terminator(';').take(2);
    let content = iter.next().map(str::trim_end)?;
    if content.is_empty() {
        return None;
    }
    let weight = match iter.next() {
        Some(s) => s
            .trim_start()
            .trim_start_matches("q=")
            .parse::<f32>()
            .ok()
            .map(|num| (num * 1000.0) as u32)
            .filter(|v| *v <= 1000)
            .unwrap_or_default(),
        None => 1000,
    };
    Some(QualityValue(content, weight))
}

/// Content codings from an `Accept-Encoding` value, ranked by descending
/// weight. Zero-weight codings are dropped; ties keep the header order.
///
/// Every surviving coding is returned, `identity` and `*` included, so the
/// caller decides which ones it can act on.
pub fn ranked_encodings(accept_encoding: &str) -> Vec<&str> {
    let mut quality_values = accept_encoding
        .split(',')
        .filter_map(parse_qvalue)
        .filter(|q| q.1 > 0)
        .collect::<Vec<_>>();
    // Stable sort: equal weights stay in header order.
    quality_values.sort_by(|a, b| b.1.cmp(&a.1));
    quality_values.into_iter().map(|q| q.0).collect()
}

/// Compress data with the named content coding.
///
/// # Parameters
///
/// * `data` - Data to be compressed.
/// * `coding` - Only support `gzip`, `deflate` and `zstd`.
pub fn encode(data: &[u8], coding: &str) -> io::Result<Vec<u8>> {
    use std::io::prelude::*;
    let mut buf = Vec::new();
    match coding {
        GZIP => {
            BufReader::new(GzEncoder::new(data, Compression::default())).read_to_end(&mut buf)?;
        }
        DEFLATE => {
            BufReader::new(ZlibEncoder::new(data, Compression::default())).read_to_end(&mut buf)?;
        }
        #[cfg(feature = "zstd")]
        ZSTD => {
            buf = zstd::encode_all(data, zstd::DEFAULT_COMPRESSION_LEVEL)?;
        }
        _ => {
            return Err(io::Error::new(io::ErrorKind::Other, "Unsupported Encoding"));
        }
    };
    Ok(buf)
}
