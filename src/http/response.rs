//! HTTP response building module
//!
//! Every response carries the `Server` header, plus CORS headers when
//! `http.enable_cors` is set.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::config::HttpConfig;

fn base(status: StatusCode, http: &HttpConfig) -> Builder {
    let builder = Response::builder()
        .status(status)
        .header("Server", http.server_name.as_str());

    if http.enable_cors {
        builder.header("Access-Control-Allow-Origin", "*")
    } else {
        builder
    }
}

/// Build a JSON response
pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    http: &HttpConfig,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return base(StatusCode::INTERNAL_SERVER_ERROR, http)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|e| {
                    log_build_error("500", &e);
                    fallback_500()
                });
        }
    };

    base(status, http)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback_500()
        })
}

/// Build 404 Not Found response
pub fn build_404_response(http: &HttpConfig) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found" }),
        http,
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str, http: &HttpConfig) -> Response<Full<Bytes>> {
    base(StatusCode::METHOD_NOT_ALLOWED, http)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(Full::new(Bytes::from_static(b"405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            fallback(StatusCode::METHOD_NOT_ALLOWED, b"405 Method Not Allowed")
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(allow: &str, http: &HttpConfig) -> Response<Full<Bytes>> {
    let mut builder = base(StatusCode::NO_CONTENT, http).header("Allow", allow);

    if http.enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", allow)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        fallback(StatusCode::NO_CONTENT, b"")
    })
}

/// Build 413 Payload Too Large response
pub fn build_413_response(http: &HttpConfig) -> Response<Full<Bytes>> {
    base(StatusCode::PAYLOAD_TOO_LARGE, http)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from_static(b"413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            fallback(StatusCode::PAYLOAD_TOO_LARGE, b"413 Payload Too Large")
        })
}

/// Plain response carrying the intended status, used when the builder
/// rejects a header
fn fallback(status: StatusCode, body: &'static [u8]) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(body)));
    *resp.status_mut() = status;
    resp
}

fn fallback_500() -> Response<Full<Bytes>> {
    let mut resp = fallback(
        StatusCode::INTERNAL_SERVER_ERROR,
        br#"{"error":"Internal server error"}"#,
    );
    resp.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
