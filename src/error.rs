//! Error types for the facturx-gateway library.
//!
//! One enum, two families of failure:
//!
//! * **Client errors** (`EmptyPayload`, `UnsupportedContentType`,
//!   `MissingPart`) — the request itself was unusable. Always mapped to 400.
//!
//! * **Infrastructure errors** (everything else) — the request was fine but
//!   the gateway could not get a usable answer out of an external tool:
//!   the executable was missing, it timed out, it exited with a hard
//!   failure, or its output contained no parseable report. Mapped to 500,
//!   except timeouts which get their own 504 so callers can tell "tool
//!   never answered" from "tool answered with garbage".
//!
//! A document that *fails* validation is NOT an error. That outcome is a
//! successful response (HTTP 422) carried by
//! [`crate::report::NormalizedReport`], never by this enum — automated
//! callers must be able to branch on "content is bad" vs "service is bad"
//! by status code alone.

use thiserror::Error;

/// All failures the gateway surfaces to callers.
///
/// Variants that wrap a tool invocation carry bounded `stdout_tail` /
/// `stderr_tail` snippets (most recent output wins — see
/// [`crate::runner`]) so operators can diagnose a failure from the error
/// body alone.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// Required payload was missing or zero-length.
    #[error("Empty payload: {what} is required and must be non-empty")]
    EmptyPayload { what: String },

    /// The declared content kind is not one this endpoint accepts.
    #[error("Unsupported content type '{given}', expected {expected}")]
    UnsupportedContentType { given: String, expected: String },

    /// A required multipart field was absent.
    #[error("Missing multipart field '{part}'")]
    MissingPart { part: String },

    /// The multipart body itself could not be read (truncated upload,
    /// bad boundary) — distinct from a well-formed body missing a field.
    #[error("Unreadable multipart body: {detail}")]
    MalformedMultipart { detail: String },

    // ── Tool invocation errors ────────────────────────────────────────────
    /// The configured executable could not be located or started.
    ///
    /// This is a deployment defect, not a bad request — the error tag lets
    /// monitoring distinguish it from ordinary tool failures.
    #[error("Executable for '{tool}' not found in the runtime environment")]
    ToolNotFound { tool: String },

    /// The external process exceeded its wall-clock budget and was killed.
    #[error("'{tool}' timed out after {secs}s")]
    ToolTimeout {
        tool: String,
        secs: u64,
        stdout_tail: String,
        stderr_tail: String,
    },

    /// Nonzero exit from a tool where nonzero unambiguously means failure.
    #[error("'{tool}' failed with exit code {code}")]
    ToolFailed {
        tool: String,
        code: i32,
        stdout_tail: String,
        stderr_tail: String,
    },

    /// The tool exited cleanly but the expected output artifact was never
    /// written (or was written empty).
    #[error("'{tool}' produced no output file")]
    OutputMissing { tool: String },

    // ── Report errors ─────────────────────────────────────────────────────
    /// No structured report could be located inside the tool's output.
    ///
    /// Some tools fail without a nonzero exit; an absent report is the only
    /// symptom. The raw tails are attached for reproduction.
    #[error("No parseable report found in '{tool}' output")]
    ReportExtractionFailed {
        tool: String,
        stdout_tail: String,
        stderr_tail: String,
    },

    /// A report was located but did not parse under its expected schema.
    #[error("Malformed report from '{tool}': {detail}")]
    ReportMalformed { tool: String, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (workspace I/O, spawn failure other than
    /// not-found, response assembly).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable tag used in JSON error bodies.
    pub fn tag(&self) -> &'static str {
        match self {
            GatewayError::EmptyPayload { .. } => "empty_payload",
            GatewayError::UnsupportedContentType { .. } => "unsupported_content_type",
            GatewayError::MissingPart { .. } => "missing_part",
            GatewayError::MalformedMultipart { .. } => "malformed_multipart",
            GatewayError::ToolNotFound { .. } => "tool_not_found",
            GatewayError::ToolTimeout { .. } => "tool_timeout",
            GatewayError::ToolFailed { .. } => "tool_failed",
            GatewayError::OutputMissing { .. } => "output_missing",
            GatewayError::ReportExtractionFailed { .. } => "report_extraction_failed",
            GatewayError::ReportMalformed { .. } => "report_malformed",
            GatewayError::Internal(_) => "internal",
        }
    }

    /// HTTP status this error maps to.
    ///
    /// 400 for client errors, 504 for timeouts, 500 for every other
    /// infrastructure failure.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::EmptyPayload { .. }
            | GatewayError::UnsupportedContentType { .. }
            | GatewayError::MissingPart { .. }
            | GatewayError::MalformedMultipart { .. } => 400,
            GatewayError::ToolTimeout { .. } => 504,
            _ => 500,
        }
    }

    /// Captured output tails, when this error carries them.
    pub fn output_tails(&self) -> Option<(&str, &str)> {
        match self {
            GatewayError::ToolTimeout {
                stdout_tail,
                stderr_tail,
                ..
            }
            | GatewayError::ToolFailed {
                stdout_tail,
                stderr_tail,
                ..
            }
            | GatewayError::ReportExtractionFailed {
                stdout_tail,
                stderr_tail,
                ..
            } => Some((stdout_tail.as_str(), stderr_tail.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_504() {
        let e = GatewayError::ToolTimeout {
            tool: "verapdf".into(),
            secs: 60,
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        };
        assert_eq!(e.http_status(), 504);
        assert_eq!(e.tag(), "tool_timeout");
    }

    #[test]
    fn client_errors_map_to_400() {
        let e = GatewayError::EmptyPayload {
            what: "request body".into(),
        };
        assert_eq!(e.http_status(), 400);

        let e = GatewayError::UnsupportedContentType {
            given: "text/plain".into(),
            expected: "application/pdf".into(),
        };
        assert_eq!(e.http_status(), 400);
        assert!(e.to_string().contains("text/plain"));

        let e = GatewayError::MalformedMultipart {
            detail: "incomplete stream".into(),
        };
        assert_eq!(e.http_status(), 400);
        assert_eq!(e.tag(), "malformed_multipart");
    }

    #[test]
    fn infrastructure_errors_map_to_500() {
        let e = GatewayError::ToolNotFound {
            tool: "ghostscript".into(),
        };
        assert_eq!(e.http_status(), 500);
        assert_eq!(e.tag(), "tool_not_found");

        let e = GatewayError::ReportMalformed {
            tool: "mustang".into(),
            detail: "unexpected end of stream".into(),
        };
        assert_eq!(e.http_status(), 500);
    }

    #[test]
    fn tails_exposed_for_diagnostic_variants() {
        let e = GatewayError::ToolFailed {
            tool: "gs".into(),
            code: 1,
            stdout_tail: "out".into(),
            stderr_tail: "err".into(),
        };
        assert_eq!(e.output_tails(), Some(("out", "err")));

        let e = GatewayError::OutputMissing { tool: "gs".into() };
        assert!(e.output_tails().is_none());
    }
}
