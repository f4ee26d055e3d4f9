// Issue API module entry
// Routes `/api/issues/:project` by method to the four issue handlers

mod fields;
mod handlers;
mod types;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::error::Error;
use std::sync::{Arc, OnceLock};

use crate::config::AppState;
use crate::http::{self, BodyError};
use crate::logger;
use crate::model::IssueFilter;
use crate::routing::PathPattern;
use fields::RequestFields;

const ISSUES_ROUTE: &str = "/api/issues/:project";
const ISSUES_ALLOW: &str = "GET, POST, PUT, DELETE, OPTIONS";

fn issues_route() -> &'static PathPattern {
    static ROUTE: OnceLock<PathPattern> = OnceLock::new();
    ROUTE.get_or_init(|| PathPattern::parse(ISSUES_ROUTE))
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let http_config = &state.config.http;

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/healthz") => {
            return Ok(http::json_response(
                StatusCode::OK,
                &json!({ "status": "ok" }),
                http_config,
            ));
        }
        (&Method::GET, "/readyz") => return Ok(readiness(&state).await),
        _ => {}
    }

    let Some(params) = issues_route().matches(req.uri().path()) else {
        return Ok(http::build_404_response(http_config));
    };
    let Some(project) = params.get("project").map(ToString::to_string) else {
        return Ok(http::build_404_response(http_config));
    };

    let method = req.method().clone();
    let reply = match method {
        Method::GET => handlers::list_issues(&state, &project, req.uri().query()).await,
        Method::OPTIONS => return Ok(http::build_options_response(ISSUES_ALLOW, http_config)),
        Method::POST | Method::PUT | Method::DELETE => {
            let Some(fields) = request_fields(req, http_config.max_body_size).await else {
                return Ok(http::build_413_response(http_config));
            };
            if method == Method::POST {
                handlers::create_issue(&state, &project, fields).await
            } else if method == Method::PUT {
                handlers::update_issue(&state, &project, fields).await
            } else {
                handlers::delete_issue(&state, &project, fields).await
            }
        }
        _ => return Ok(http::build_405_response(ISSUES_ALLOW, http_config)),
    };

    Ok(http::json_response(StatusCode::OK, &reply, http_config))
}

/// Read and parse the body. `None` only when it exceeds the size limit;
/// an unreadable body counts as empty.
async fn request_fields<B>(req: Request<B>, limit: u64) -> Option<RequestFields>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    let content_type = parts
        .headers
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match http::read_body(body, limit).await {
        Ok(bytes) => Some(RequestFields::parse(content_type, &bytes)),
        Err(BodyError::TooLarge) => {
            logger::log_warning(&format!("Request body exceeds {limit} bytes"));
            None
        }
        Err(BodyError::Unreadable(e)) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Some(RequestFields::default())
        }
    }
}

async fn readiness(state: &AppState) -> Response<Full<Bytes>> {
    let http_config = &state.config.http;
    match state.store.find(&IssueFilter::for_project("")).await {
        Ok(_) => http::json_response(StatusCode::OK, &json!({ "status": "ok" }), http_config),
        Err(e) => {
            logger::log_store_error("readiness", &e);
            http::json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &json!({ "status": "unavailable" }),
                http_config,
            )
        }
    }
}
