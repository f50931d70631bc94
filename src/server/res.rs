// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Response factory functions.
//!
//! Error responses carry the bare canonical reason phrase as a
//! `text/plain` body; `304` carries nothing at all.

use headers::{ContentLength, ContentType, HeaderMapExt};
use hyper::StatusCode;

use crate::server::Response;

/// Generate 304 NotModified response.
pub fn not_modified(mut res: Response) -> Response {
    *res.status_mut() = StatusCode::NOT_MODIFIED;
    res
}

/// Generate 400 BadRequest response.
pub fn bad_request(res: Response) -> Response {
    prepare_response(res, StatusCode::BAD_REQUEST, "Bad Request")
}

/// Generate 403 Forbidden response.
pub fn forbidden(res: Response) -> Response {
    prepare_response(res, StatusCode::FORBIDDEN, "Forbidden")
}

/// Generate 404 NotFound response.
pub fn not_found(res: Response) -> Response {
    prepare_response(res, StatusCode::NOT_FOUND, "Not Found")
}

fn prepare_response(mut res: Response, code: StatusCode, body: &'static str) -> Response {
    *res.status_mut() = code;
    *res.body_mut() = body.into();
    res.headers_mut()
        .typed_insert(ContentLength(body.len() as u64));
    res.headers_mut().typed_insert(ContentType::text());
    res
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn response_304_is_bare() {
        let res = not_modified(Response::default());
        assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
        assert!(res.headers().typed_get::<ContentLength>().is_none());
        assert!(res.headers().typed_get::<ContentType>().is_none());
    }

    #[test]
    fn response_400() {
        let res = bad_request(Response::default());
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.headers().typed_get::<ContentLength>().unwrap(),
            ContentLength(11),
        );
    }

    #[test]
    fn response_403() {
        let res = forbidden(Response::default());
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            res.headers().typed_get::<ContentLength>().unwrap(),
            ContentLength(9),
        );
    }

    #[test]
    fn response_404() {
        let res = not_found(Response::default());
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.headers().typed_get::<ContentLength>().unwrap(),
            ContentLength(9),
        );
        assert_eq!(
            res.headers().typed_get::<ContentType>().unwrap(),
            ContentType::text(),
        );
    }
}
