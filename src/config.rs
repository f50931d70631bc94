// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Immutable runtime configuration.
//!
//! Built once from the command-line arguments and shared by every request.
//! The capability sets (`minifiers`, `compressors`) describe what this
//! build of the binary can produce and are fixed at compile time by cargo
//! features.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::cli::Args;
use crate::http::content_encoding::{DEFLATE, GZIP, ZSTD};

pub const DEFAULT_VALID_FOR: i64 = 86_400;

pub const TEXT_CSS: &str = "text/css";
pub const APPLICATION_JAVASCRIPT: &str = "application/javascript";

/// Fallback cache policy and transform toggles.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub valid_for: i64,
    pub cache_control: Vec<String>,
    pub minify: bool,
    pub compress: bool,
    pub etag: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            valid_for: DEFAULT_VALID_FOR,
            cache_control: vec!["public".to_owned()],
            minify: true,
            compress: true,
            etag: true,
        }
    }
}

/// Per-extension overrides, keyed by dot-prefixed extension (`".css"`).
#[derive(Debug, Clone, Default)]
pub struct TypeRule {
    pub content_type: Option<String>,
    pub valid_for: Option<i64>,
    pub cache_control: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute directory under which all served files must reside.
    pub root: PathBuf,
    /// Charset appended to text-ish content types.
    pub encoding: String,
    pub defaults: Defaults,
    pub types: HashMap<String, TypeRule>,
    /// Directory (relative to `root`) holding minified outputs. When set,
    /// minified files are written there and read from there exclusively.
    pub min_cache_dir: Option<String>,
    /// Filenames tried, in order, when a request resolves to a directory.
    pub index_files: Vec<String>,
    /// Route requests into `<root>/<host>` instead of `<root>`.
    pub vhost_mode: bool,
    /// Content types this build can minify.
    pub minifiers: HashSet<String>,
    /// Content codings this build can produce, in no particular order.
    pub compressors: Vec<&'static str>,
}

impl Config {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            encoding: "UTF-8".to_owned(),
            defaults: Defaults::default(),
            types: HashMap::new(),
            min_cache_dir: None,
            index_files: vec!["index.html".to_owned()],
            vhost_mode: false,
            minifiers: available_minifiers(),
            compressors: available_compressors(),
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        let mut config = Config::new(args.path.clone());
        config.defaults.valid_for = args.cache;
        config.defaults.minify = args.minify;
        config.defaults.compress = args.compress;
        config.defaults.etag = args.etag;
        config.min_cache_dir = args.min_cache_dir.clone();
        config.index_files = args.index_files.clone();
        config.vhost_mode = args.vhost_mode;
        config
    }
}

fn available_minifiers() -> HashSet<String> {
    let mut minifiers = HashSet::new();
    if cfg!(feature = "minify-css") {
        minifiers.insert(TEXT_CSS.to_owned());
    }
    if cfg!(feature = "minify-js") {
        minifiers.insert(APPLICATION_JAVASCRIPT.to_owned());
    }
    minifiers
}

fn available_compressors() -> Vec<&'static str> {
    let mut compressors = vec![GZIP, DEFLATE];
    if cfg!(feature = "zstd") {
        compressors.push(ZSTD);
    }
    compressors
}

#[cfg(test)]
mod t {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_policy() {
        let config = Config::new(PathBuf::from("/srv"));
        assert_eq!(config.defaults.valid_for, 86_400);
        assert_eq!(config.defaults.cache_control, ["public"]);
        assert!(config.defaults.minify);
        assert!(config.defaults.compress);
        assert!(config.defaults.etag);
        assert_eq!(config.index_files, ["index.html"]);
        assert_eq!(config.encoding, "UTF-8");
    }

    #[test]
    fn baseline_compressors() {
        let config = Config::new(PathBuf::from("/srv"));
        assert!(config.compressors.contains(&GZIP));
        assert!(config.compressors.contains(&DEFLATE));
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_compressor_compiled_in() {
        let config = Config::new(PathBuf::from("/srv"));
        assert!(config.compressors.contains(&ZSTD));
    }

    #[cfg(feature = "minify-css")]
    #[test]
    fn css_minifier_compiled_in() {
        let config = Config::new(PathBuf::from("/srv"));
        assert!(config.minifiers.contains(TEXT_CSS));
    }

    #[test]
    fn from_args() {
        let args = Args {
            path: Path::new("/srv").to_owned(),
            cache: 60,
            minify: false,
            etag: false,
            min_cache_dir: Some("min".to_owned()),
            ..Default::default()
        };
        let config = Config::from(&args);
        assert_eq!(config.root, Path::new("/srv"));
        assert_eq!(config.defaults.valid_for, 60);
        assert!(!config.defaults.minify);
        assert!(config.defaults.compress);
        assert!(!config.defaults.etag);
        assert_eq!(config.min_cache_dir.as_deref(), Some("min"));
    }
}
