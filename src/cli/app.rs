// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use clap::crate_description;
use clap::{Arg, ArgMatches};

const ABOUT: &str = concat!("\n", crate_description!()); // Add extra newline.

fn app() -> clap::Command<'static> {
    let arg_port = Arg::new("port")
        .short('p')
        .long("port")
        .default_value("5000")
        .help("Specify port to listen on")
        .value_name("port");

    let arg_address = Arg::new("address")
        .short('b')
        .long("bind")
        .default_value("127.0.0.1")
        .help("Specify bind address")
        .value_name("address");

    let arg_cache = Arg::new("cache")
        .short('c')
        .long("cache")
        .default_value("86400")
        .allow_hyphen_values(true)
        .help("Specify how long responses stay valid, in seconds")
        .value_name("seconds");

    let arg_path = Arg::new("path")
        .default_value(".")
        .allow_invalid_utf8(true)
        .help("Path to a directory for serving files");

    let arg_no_minify = Arg::new("no-minify")
        .long("no-minify")
        .help("Don't minify CSS and JavaScript before serving");

    let arg_no_compress = Arg::new("no-compress")
        .long("no-compress")
        .help("Don't negotiate compressed responses");

    let arg_no_etag = Arg::new("no-etag")
        .long("no-etag")
        .help("Don't create or validate ETags");

    let arg_vhost_mode = Arg::new("vhost-mode")
        .long("vhost-mode")
        .help("Serve each request from a per-host directory under the root");

    let arg_ignore_file = Arg::new("ignore-file")
        .long("ignore-file")
        .help("Hide files matching the rules in this gitignore-syntax file")
        .value_name("path");

    let arg_min_cache_dir = Arg::new("min-cache-dir")
        .long("min-cache-dir")
        .help("Write minified files into this directory (relative to the root)")
        .value_name("dir");

    let arg_index = Arg::new("index")
        .long("index")
        .multiple_occurrences(true)
        .help("Filename tried when a directory is requested; may repeat")
        .value_name("name");

    let arg_no_log = Arg::new("no-log")
        .long("no-log")
        .help("Don't log any request/response information.");

    clap::command!()
        .about(ABOUT)
        .arg(arg_address)
        .arg(arg_port)
        .arg(arg_cache)
        .arg(arg_path)
        .arg(arg_no_minify)
        .arg(arg_no_compress)
        .arg(arg_no_etag)
        .arg(arg_vhost_mode)
        .arg(arg_ignore_file)
        .arg(arg_min_cache_dir)
        .arg(arg_index)
        .arg(arg_no_log)
}

pub fn matches() -> ArgMatches {
    app().get_matches()
}
