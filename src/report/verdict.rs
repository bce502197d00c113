//! Mapping reports and failures to HTTP responses.
//!
//! The status-code contract automated callers branch on:
//!
//! | outcome                                   | status |
//! |-------------------------------------------|--------|
//! | report parsed, document passed            | 200    |
//! | report parsed, document failed the check  | 422    |
//! | request unusable (empty body, bad type)   | 400    |
//! | tool never answered (timeout)             | 504    |
//! | everything else (missing exe, bad report) | 500    |
//!
//! 422 is a *successful* response: the infrastructure worked, the content
//! did not. Infrastructure errors carry a machine tag plus bounded raw
//! output tails so operators can reproduce the failure from the body alone.

use crate::error::GatewayError;
use crate::report::NormalizedReport;
use crate::runner::tail;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Bytes of raw stdout/stderr tail attached to error bodies.
pub const DIAGNOSTIC_TAIL_BYTES: usize = 4096;

/// Final outcome of a request: boolean verdict, HTTP status, JSON body.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub ok: bool,
    pub http_status: u16,
    pub body: Value,
}

impl Verdict {
    /// Verdict for an invoice validation report (`/validate`).
    pub fn from_validation(report: &NormalizedReport) -> Self {
        let status = if report.valid { 200 } else { 422 };
        Self {
            ok: report.valid,
            http_status: status,
            body: json!({
                "ok": report.valid,
                "status": report.status,
                "report": {
                    "filename": report.source_filename,
                    "datetime": report.produced_at,
                },
                "findings": report.findings,
            }),
        }
    }

    /// Verdict for a PDF/A conformance report (`/validate_pdfa`).
    pub fn from_conformance(report: &NormalizedReport) -> Self {
        let status = if report.valid { 200 } else { 422 };
        Self {
            ok: report.valid,
            http_status: status,
            body: json!({
                "ok": report.valid,
                "verapdf": report,
            }),
        }
    }

    /// Verdict for a failure to produce a report at all.
    pub fn from_error(err: &GatewayError) -> Self {
        let mut body = json!({
            "ok": false,
            "error": err.tag(),
            "message": err.to_string(),
        });
        if let Some((stdout_tail, stderr_tail)) = err.output_tails() {
            body["stdout_tail"] = json!(tail(stdout_tail, DIAGNOSTIC_TAIL_BYTES));
            body["stderr_tail"] = json!(tail(stderr_tail, DIAGNOSTIC_TAIL_BYTES));
        }
        Self {
            ok: false,
            http_status: err.http_status(),
            body,
        }
    }
}

impl IntoResponse for Verdict {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

impl From<GatewayError> for Verdict {
    fn from(err: GatewayError) -> Self {
        Verdict::from_error(&err)
    }
}
