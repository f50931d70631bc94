// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

macro_rules! bail {
    ($($tt:tt)*) => {
        return Err(From::from(format!($($tt)*)));
    }
}

mod cli;
mod config;
mod extensions;
mod http;
mod server;
#[cfg(test)]
mod test_utils;

use std::process;

use tracing_subscriber::EnvFilter;

use crate::cli::{matches, Args};
use crate::server::serve;

pub type BoxResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let result = match Args::parse(matches()) {
        Ok(args) => serve(args).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1)
    }
}
