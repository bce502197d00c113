//! HTTP surface: routes, handlers, response assembly.
//!
//! Deliberately thin — handlers authenticate, pull bytes out of the
//! request, call one operation from [`crate::ops`], and turn the outcome
//! into a response. All interesting behaviour (workspaces, subprocesses,
//! report normalization, status mapping) lives below this layer, where it
//! is testable without HTTP.

pub mod auth;

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::ops::embed::EmbedOptions;
use crate::ops::{conformance, diagram, embed, pdfa, validate, versions};
use crate::report::verdict::Verdict;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Uploads are whole documents; scanned PDFs run large.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
}

/// Build the application router.
pub fn router(config: Arc<ServiceConfig>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/versions", get(tool_versions))
        .route("/generate", post(generate))
        .route("/convert_pdfa3", post(convert_pdfa3))
        .route("/embed_xml", post(embed_xml))
        .route("/validate", post(validate_invoice))
        .route("/validate_pdfa", post(validate_pdfa))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(AppState { config })
}

// ── Diagnostic endpoints ─────────────────────────────────────────────────

async fn healthz() -> &'static str {
    "ok"
}

async fn tool_versions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let tools = versions::probe(&state.config).await;
    Json(json!({ "ok": true, "tools": tools }))
}

// ── Binary-artifact endpoints ────────────────────────────────────────────

async fn generate(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(denied) = auth::require(&state.config, &headers) {
        return denied;
    }
    if let Err(e) = require_payload(&body, "request body") {
        return Verdict::from(e).into_response();
    }
    match diagram::generate(&state.config, &body).await {
        Ok(png) => binary_response(png, "image/png", None),
        Err(e) => Verdict::from(e).into_response(),
    }
}

async fn convert_pdfa3(State(state): State<AppState>, request: Request) -> Response {
    if let Err(denied) = auth::require(&state.config, request.headers()) {
        return denied;
    }

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    // Two accepted shapes, mirroring what clients actually send: a raw
    // PDF body, or a multipart form with a `file` field.
    let pdf = if content_type.starts_with("multipart/form-data") {
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => match single_part(multipart, "file").await {
                Ok(bytes) => bytes,
                Err(e) => return Verdict::from(e).into_response(),
            },
            Err(e) => {
                return Verdict::from(GatewayError::MalformedMultipart {
                    detail: e.to_string(),
                })
                .into_response()
            }
        }
    } else if content_type.starts_with("application/pdf") {
        match Bytes::from_request(request, &()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return Verdict::from(GatewayError::Internal(format!(
                    "Failed to read request body: {e}"
                )))
                .into_response()
            }
        }
    } else {
        return Verdict::from(GatewayError::UnsupportedContentType {
            given: content_type,
            expected: "application/pdf or multipart/form-data".into(),
        })
        .into_response();
    };

    if let Err(e) = require_payload(&pdf, "PDF document") {
        return Verdict::from(e).into_response();
    }

    match pdfa::convert(&state.config, &pdf).await {
        Ok(converted) => binary_response(converted, "application/pdf", Some("output_pdfa3.pdf")),
        Err(e) => Verdict::from(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct EmbedParams {
    format: Option<String>,
    version: Option<String>,
    profile: Option<String>,
}

async fn embed_xml(
    State(state): State<AppState>,
    Query(params): Query<EmbedParams>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(denied) = auth::require(&state.config, &headers) {
        return denied;
    }

    let (pdf, xml) = match two_parts(multipart, "pdf_file", "xml_file").await {
        Ok(parts) => parts,
        Err(e) => return Verdict::from(e).into_response(),
    };

    let defaults = EmbedOptions::defaults(&state.config);
    let options = EmbedOptions {
        format: params.format.unwrap_or(defaults.format),
        version: params.version.unwrap_or(defaults.version),
        profile: params.profile.unwrap_or(defaults.profile),
    };

    match embed::combine(&state.config, &pdf, &xml, &options).await {
        Ok(combined) => binary_response(
            combined,
            "application/pdf",
            Some(&options.suggested_filename()),
        ),
        Err(e) => Verdict::from(e).into_response(),
    }
}

// ── Validation endpoints ─────────────────────────────────────────────────

async fn validate_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(denied) = auth::require(&state.config, &headers) {
        return denied;
    }
    if let Err(e) = require_payload(&body, "invoice XML") {
        return Verdict::from(e).into_response();
    }
    match validate::validate_invoice(&state.config, &body).await {
        Ok(report) => Verdict::from_validation(&report).into_response(),
        Err(e) => Verdict::from(e).into_response(),
    }
}

async fn validate_pdfa(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(denied) = auth::require(&state.config, &headers) {
        return denied;
    }
    if let Err(e) = require_payload(&body, "PDF document") {
        return Verdict::from(e).into_response();
    }
    match conformance::check_conformance(&state.config, &body).await {
        Ok(report) => Verdict::from_conformance(&report).into_response(),
        Err(e) => Verdict::from(e).into_response(),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn require_payload(bytes: &[u8], what: &str) -> Result<(), GatewayError> {
    if bytes.is_empty() {
        Err(GatewayError::EmptyPayload { what: what.into() })
    } else {
        Ok(())
    }
}

fn binary_response(bytes: Vec<u8>, content_type: &str, attachment: Option<&str>) -> Response {
    let mut response = (StatusCode::OK, bytes).into_response();
    if let Ok(value) = header::HeaderValue::from_str(content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    if let Some(filename) = attachment {
        if let Ok(value) =
            header::HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }
    response
}

/// Pull exactly one named field out of a multipart body. A read error is
/// surfaced as [`GatewayError::MalformedMultipart`], never collapsed into
/// a missing field.
async fn single_part(mut multipart: Multipart, name: &str) -> Result<Bytes, GatewayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::MalformedMultipart {
            detail: e.to_string(),
        })?
    {
        if field.name() == Some(name) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| GatewayError::MalformedMultipart {
                    detail: format!("part '{name}': {e}"),
                })?;
            if bytes.is_empty() {
                return Err(GatewayError::EmptyPayload { what: name.into() });
            }
            return Ok(bytes);
        }
    }
    Err(GatewayError::MissingPart { part: name.into() })
}

/// Pull two named fields out of one multipart pass (field order is the
/// client's choice).
async fn two_parts(
    mut multipart: Multipart,
    first: &str,
    second: &str,
) -> Result<(Bytes, Bytes), GatewayError> {
    let mut a: Option<Bytes> = None;
    let mut b: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::MalformedMultipart {
            detail: e.to_string(),
        })?
    {
        let name = field.name().map(str::to_string);
        let Some(name) = name else { continue };
        if name == first || name == second {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| GatewayError::MalformedMultipart {
                    detail: format!("part '{name}': {e}"),
                })?;
            if bytes.is_empty() {
                return Err(GatewayError::EmptyPayload { what: name });
            }
            if name == first {
                a = Some(bytes);
            } else {
                b = Some(bytes);
            }
        }
    }
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        (None, _) => Err(GatewayError::MissingPart {
            part: first.into(),
        }),
        (_, None) => Err(GatewayError::MissingPart {
            part: second.into(),
        }),
    }
}

/// Serve the router on `addr` until the process is stopped.
pub async fn serve(config: Arc<ServiceConfig>, addr: std::net::SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, router(config)).await
}
