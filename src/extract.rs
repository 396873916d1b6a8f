//! Request extractors that report rejections as JSON `{"detail": ...}` bodies.
//!
//! These wrap axum's `Json`, `Query` and `Path` extractors and convert their
//! rejections into [Error], so a malformed body or query string gets the same
//! response shape as every other client error.

use axum::extract::{
    FromRequest, FromRequestParts,
    multipart::MultipartRejection,
    rejection::{JsonRejection, PathRejection, QueryRejection},
};

use crate::Error;

/// A JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);

/// A typed path segment.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParam<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::RequestRejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::RequestRejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::RequestRejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::MultipartError(rejection.body_text())
    }
}
