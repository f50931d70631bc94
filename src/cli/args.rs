// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::env;
use std::fs::canonicalize;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::ArgMatches;

use crate::BoxResult;

#[derive(Debug, Clone)]
pub struct Args {
    pub address: String,
    pub port: u16,
    pub path: PathBuf,
    pub cache: i64,
    pub minify: bool,
    pub compress: bool,
    pub etag: bool,
    pub vhost_mode: bool,
    pub ignore_file: Option<PathBuf>,
    pub min_cache_dir: Option<String>,
    pub index_files: Vec<String>,
    pub log: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_owned(),
            port: 5000,
            path: PathBuf::from("."),
            cache: 86_400,
            minify: true,
            compress: true,
            etag: true,
            vhost_mode: false,
            ignore_file: None,
            min_cache_dir: None,
            index_files: vec!["index.html".to_owned()],
            log: false,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse(matches: ArgMatches) -> BoxResult<Args> {
        let address = matches.value_of("address").unwrap_or_default().to_owned();
        let port = matches.value_of("port").unwrap_or_default().parse::<u16>()?;
        let cache = matches.value_of("cache").unwrap_or_default().parse::<i64>()?;
        let path = matches.value_of_os("path").unwrap_or_default();
        let path = Args::parse_path(&path.to_string_lossy())?;

        let minify = !matches.is_present("no-minify");
        let compress = !matches.is_present("no-compress");
        let etag = !matches.is_present("no-etag");
        let vhost_mode = matches.is_present("vhost-mode");
        let ignore_file = matches.value_of("ignore-file").map(PathBuf::from);
        let min_cache_dir = matches.value_of("min-cache-dir").map(str::to_owned);
        let index_files = match matches.values_of("index") {
            Some(names) => names.map(str::to_owned).collect(),
            None => vec!["index.html".to_owned()],
        };
        let log = !matches.is_present("no-log");

        Ok(Args {
            address,
            port,
            path,
            cache,
            minify,
            compress,
            etag,
            vhost_mode,
            ignore_file,
            min_cache_dir,
            index_files,
            log,
        })
    }

    /// Parse path.
    fn parse_path(path: &str) -> BoxResult<PathBuf> {
        let path = PathBuf::from(path);
        if !path.exists() {
            bail!("error: path \"{}\" doesn't exist", path.display());
        }

        (if path.is_absolute() {
            path.canonicalize()
        } else {
            env::current_dir().map(|p| p.join(&path))
        })
        .and_then(canonicalize)
        .or_else(|err| {
            bail!(
                "error: failed to access path \"{}\": {}",
                path.display(),
                err,
            );
        })
    }

    /// Construct socket address from arguments.
    pub fn address(&self) -> BoxResult<SocketAddr> {
        format!("{}:{}", self.address, self.port)
            .parse()
            .or_else(|err| {
                bail!(
                    "error: invalid address {}:{} : {}",
                    self.address,
                    self.port,
                    err,
                );
            })
    }
}
