//! Middleware for logging requests and responses.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

use serde_json::Value;

use crate::{Error, auth::API_KEY_HEADER};

/// The maximum number of bytes of a body that is logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// API keys in headers, query strings and JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return Error::InvalidArgument("could not read request body".to_owned())
                .into_response();
        }
    };
    log_request(&parts, &String::from_utf8_lossy(&body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(API_KEY_HEADER) {
        headers.insert(API_KEY_HEADER, HeaderValue::from_static(REDACTED));
    }

    headers
}

fn redact_query(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_owned();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("api_key", _)) => format!("api_key={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{query}", uri.path())
}

/// Replace every `api_key` value in a JSON body, at any depth.
///
/// Bodies that are not JSON are returned as is.
fn redact_json_body(body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    redact_api_keys(&mut value);
    value.to_string()
}

fn redact_api_keys(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                if key == "api_key" {
                    *field = Value::String(REDACTED.to_owned());
                } else {
                    redact_api_keys(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_api_keys),
        _ => {}
    }
}

fn truncate(text: &str) -> &str {
    if text.len() <= LOG_BODY_LENGTH_LIMIT {
        return text;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    let body = redact_json_body(body);
    let uri = redact_query(&parts.uri);
    let headers = redact_headers(&parts.headers);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {uri} {headers:#?}\nbody: {:}...",
            parts.method,
            truncate(&body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {} {uri} {headers:#?}\nbody: {body:?}", parts.method);
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    let body = redact_json_body(body);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {} {:#?}\nbody: {:}...",
            parts.status,
            parts.headers,
            truncate(&body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!(
            "Sending response: {} {:#?}\nbody: {body:?}",
            parts.status,
            parts.headers
        );
    }
}
