// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::Path;
use std::time::SystemTime;

use mime_guess::mime::Mime;

pub trait PathExt {
    fn mime(&self) -> Option<Mime>;
    fn mtime(&self) -> Option<SystemTime>;
    fn filename_str(&self) -> &str;
}

impl PathExt for Path {
    /// Guess MIME type from a path.
    fn mime(&self) -> Option<Mime> {
        mime_guess::from_path(self).first()
    }

    /// Get modified time from a path. `None` when the file is gone or the
    /// platform cannot report mtimes.
    fn mtime(&self) -> Option<SystemTime> {
        self.metadata().and_then(|meta| meta.modified()).ok()
    }

    /// Get a filename `&str` from a path.
    fn filename_str(&self) -> &str {
        self.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

pub trait SystemTimeExt {
    fn timestamp_sec(&self) -> u64;
}

impl SystemTimeExt for SystemTime {
    /// Convert `SystemTime` to timestamp in seconds.
    fn timestamp_sec(&self) -> u64 {
        self.duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
