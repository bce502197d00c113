//! Report normalization: one common shape for two incompatible schemas.
//!
//! The gateway consumes two structurally different reports — Mustang's XML
//! validation report and veraPDF's JSON conformance report — and reconciles
//! both into a [`NormalizedReport`] so every caller sees the same
//! `{valid, status, findings}` contract regardless of which tool answered.
//!
//! ## Data Flow
//!
//! ```text
//! captured text ──▶ extract ──▶ mustang / verapdf ──▶ verdict
//!  (log noise +     (payload      (schema-specific      (HTTP status
//!   payload)         substring)    normalization)        + JSON body)
//! ```
//!
//! 1. [`extract`] — isolate the structured payload from surrounding log
//!    lines (two-pointer scan for XML, strict full-text parse for JSON)
//! 2. [`mustang`] — parse the XML validation report
//! 3. [`verapdf`] — traverse the JSON conformance report; total function,
//!    degrades to invalid instead of failing
//! 4. [`verdict`] — map a report or an error to a response

pub mod extract;
pub mod mustang;
pub mod verapdf;
pub mod verdict;

use serde::Serialize;
use std::collections::BTreeMap;

/// The common report shape both normalizers produce.
///
/// `status` is always the wrapped tool's own vocabulary (`"valid"`,
/// `"invalid"`, `"compliant"`, `"unknown"`, …) — the gateway never invents
/// a status; when parsing fails the request carries a
/// [`crate::error::GatewayError`] instead of a report.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedReport {
    /// The boolean verdict derived from the tool's own output.
    pub valid: bool,
    /// Source filename as reported by the tool, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// Report timestamp as reported by the tool, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produced_at: Option<String>,
    /// Tool-specific status vocabulary, copied verbatim.
    pub status: String,
    /// Ordered findings, in report order.
    pub findings: Vec<Finding>,
}

/// One structured entry inside a validation report.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Entry kind — the XML tag name or the JSON rule classification.
    pub kind: String,
    /// Attributes copied from the report entry. `BTreeMap` for stable
    /// serialization order.
    pub attributes: BTreeMap<String, String>,
    /// Trimmed human-readable message.
    pub message: String,
}
