// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod compress;
mod etag;
mod minify;
mod policy;
mod res;
mod resolve;
mod sidecar;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use headers::{ContentLength, ContentType, Expires, HeaderMapExt, LastModified};
use hyper::header::{
    HeaderValue, ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_ENCODING, ETAG, HOST, IF_MODIFIED_SINCE,
    IF_NONE_MATCH, VARY,
};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method};
use ignore::gitignore::Gitignore;
use mime_guess::mime::Mime;
use percent_encoding::percent_decode;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::cli::Args;
use crate::config::Config;
use crate::extensions::PathExt;
use crate::http::conditional_requests;
use crate::server::resolve::ResolveError;
use crate::BoxResult;

pub type Request = hyper::Request<Body>;
pub type Response = hyper::Response<Body>;

/// The on-disk byte sequence chosen for serving, plus its metadata.
///
/// `current_file` starts at the resolved source file and may be swapped
/// for a minified and then a compressed sibling as the pipeline runs; the
/// logical path the client asked for never changes.
#[derive(Debug)]
pub struct Representation {
    pub logical_path: String,
    pub current_file: PathBuf,
    pub content_type: String,
    pub extension: String,
    pub valid_for: i64,
    pub cache_control: Vec<String>,
    pub should_etag: bool,
    pub content_encoding: Option<&'static str>,
    pub etag: Option<String>,
}

/// Run the server.
pub async fn serve(args: Args) -> BoxResult<()> {
    let address = args.address()?;

    let inner = Arc::new(InnerService::new(args));
    let make_svc = make_service_fn(move |_| {
        let inner = inner.clone();
        async {
            Ok::<_, hyper::Error>(service_fn(move |req| {
                let inner = inner.clone();
                inner.call(req)
            }))
        }
    });
    let server = hyper::Server::bind(&address).serve(make_svc);
    let address = server.local_addr();
    eprintln!("Files served on http://{address}");

    if let Err(e) = server.await {
        eprintln!("Server error: {e:?}");
    };

    Ok(())
}

struct InnerService {
    config: Config,
    ignore: Option<Gitignore>,
    log: bool,
}

impl InnerService {
    pub fn new(args: Args) -> Self {
        let config = Config::from(&args);
        let ignore = args.ignore_file.as_deref().map(|path| Gitignore::new(path).0);
        Self {
            config,
            ignore,
            log: args.log,
        }
    }

    pub async fn call(self: Arc<Self>, req: Request) -> Result<Response, hyper::Error> {
        let mut res = self.handle_request(&req).await;
        // The pipeline treats every method like GET; strip the body for
        // HEAD here at the transport edge.
        if req.method() == Method::HEAD {
            *res.body_mut() = Body::empty();
        }
        if self.log {
            info!(r#""{} {}" - {}"#, req.method(), req.uri(), res.status());
        }
        Ok(res)
    }

    /// The request pipeline, in fixed order: resolve, type/policy, minify,
    /// compress, conditional checks, etag, build. Resolver failures are
    /// fatal to the request; the transform stages degrade to the best
    /// representation available.
    async fn handle_request(&self, req: &Request) -> Response {
        let res = Response::default();

        let path_info = match percent_decode(req.uri().path().as_bytes()).decode_utf8() {
            Ok(path) => path,
            Err(_) => return res::bad_request(res),
        };

        let vhost_root;
        let root = if self.config.vhost_mode {
            match self.vhost_root(req) {
                Some(dir) => {
                    vhost_root = dir;
                    &vhost_root
                }
                None => return res::forbidden(res),
            }
        } else {
            &self.config.root
        };

        let resolved = match resolve::resolve(root, &self.config.index_files, &path_info) {
            Ok(resolved) => resolved,
            Err(ResolveError::BadRequest) => return res::bad_request(res),
            Err(ResolveError::Forbidden) => return res::forbidden(res),
            Err(ResolveError::NotFound) => return res::not_found(res),
        };

        if self.path_is_ignored(&resolved.file) {
            return res::not_found(res);
        }

        let policy = policy::select(&self.config, &resolved.file);
        let mut rep = Representation {
            logical_path: resolved.logical_path,
            current_file: resolved.file,
            content_type: policy.content_type,
            extension: policy.extension,
            valid_for: policy.valid_for,
            cache_control: policy.cache_control,
            should_etag: policy.should_etag,
            content_encoding: None,
            etag: None,
        };

        minify::apply(&self.config, &mut rep);
        compress::apply(&self.config, &mut rep, req.headers().get(ACCEPT_ENCODING));

        // Conditional checks run after the transforms so the validators
        // describe the exact representation selected above.
        if let Some(if_modified_since) = req.headers().get(IF_MODIFIED_SINCE) {
            if let Some(mtime) = rep.current_file.mtime() {
                if conditional_requests::is_unmodified_since(if_modified_since, mtime) {
                    return res::not_modified(res);
                }
            }
        }
        if rep.should_etag {
            rep.etag = etag::load_or_create(&rep.current_file);
            if let (Some(if_none_match), Some(tag)) =
                (req.headers().get(IF_NONE_MATCH), &rep.etag)
            {
                if conditional_requests::matches_etag(if_none_match, tag) {
                    return res::not_modified(res);
                }
            }
        }

        self.build_response(res, &rep)
    }

    /// Open the selected representation and assemble the `200` headers.
    /// An open failure at this point is a permission problem: 403.
    fn build_response(&self, mut res: Response, rep: &Representation) -> Response {
        let file = match fs::File::open(&rep.current_file) {
            Ok(file) => file,
            Err(_) => return res::forbidden(res),
        };
        let meta = match file.metadata() {
            Ok(meta) => meta,
            Err(_) => return res::forbidden(res),
        };
        let mtime = meta.modified().unwrap_or(UNIX_EPOCH);

        let headers = res.headers_mut();
        if let Some(coding) = rep.content_encoding {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static(coding));
        }
        headers.typed_insert(ContentLength(meta.len()));
        if let Ok(mime) = self.full_content_type(rep).parse::<Mime>() {
            headers.typed_insert(ContentType::from(mime));
        }
        headers.typed_insert(LastModified::from(mtime));
        let expires = if rep.valid_for >= 0 {
            mtime + Duration::from_secs(rep.valid_for as u64)
        } else {
            UNIX_EPOCH
        };
        headers.typed_insert(Expires::from(expires));
        if let Ok(cache_control) = HeaderValue::from_str(&rep.cache_control.join(", ")) {
            headers.insert(CACHE_CONTROL, cache_control);
        }
        if let Some(tag) = &rep.etag {
            if let Ok(tag) = HeaderValue::from_str(tag) {
                headers.insert(ETAG, tag);
            }
        }
        // Representation varies, so responds with a `Vary` header.
        headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));

        *res.body_mut() = Body::wrap_stream(ReaderStream::new(tokio::fs::File::from_std(file)));
        res
    }

    /// Append the configured charset to textual media types.
    fn full_content_type(&self, rep: &Representation) -> String {
        const CHARSET_TYPES: [&str; 3] = [
            "application/json",
            "application/xml",
            "application/javascript",
        ];
        let content_type = &rep.content_type;
        if content_type.starts_with("text/") || CHARSET_TYPES.contains(&content_type.as_str()) {
            format!("{}; charset={}", content_type, self.config.encoding)
        } else {
            content_type.clone()
        }
    }

    /// Per-host document root: `<root>/<host>`, with the port stripped and
    /// anything that could change directories rejected.
    fn vhost_root(&self, req: &Request) -> Option<PathBuf> {
        let host = req.headers().get(HOST)?.to_str().ok()?;
        let host = host
            .split(':')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if host.is_empty() || host == "." || host == ".." || host.contains(['/', '\\', '\0']) {
            return None;
        }
        Some(self.config.root.join(host))
    }

    fn path_is_ignored(&self, path: &Path) -> bool {
        match &self.ignore {
            Some(gitignore) => gitignore.matched(path, false).is_ignore(),
            None => false,
        }
    }
}
