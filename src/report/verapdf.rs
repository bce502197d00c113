//! Normalizer for veraPDF's JSON conformance report.
//!
//! veraPDF's JSON schema has drifted across releases: the `report` wrapper
//! is sometimes absent, `validationResult` moved, batch counters were
//! renamed. This normalizer therefore never fails — every lookup is an
//! `Option` chain and any shape mismatch degrades the verdict to
//! `valid: false` with `status: "unknown"` instead of failing the request.
//! The fallback order is deliberate and fixed:
//!
//! 1. `jobs[0].validationResult.isCompliant` — the authoritative verdict
//!    when present;
//! 2. batch-summary counters — accepted only for the unambiguous
//!    single-job case (1 job, 1 compliant, 0 failed, 0 parse failures);
//! 3. neither — `unknown`, not compliant.

use crate::report::{Finding, NormalizedReport};
use serde_json::Value;

/// Normalize a parsed veraPDF JSON report. Total function: always returns
/// a report, never panics or errors.
pub fn parse_conformance_report(value: &Value) -> NormalizedReport {
    // Optional top-level wrapper object.
    let body = value.get("report").unwrap_or(value);

    let job = body.get("jobs").and_then(|j| j.get(0));
    let source_filename = job
        .and_then(|j| j.get("itemDetails"))
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let validation_result = job.and_then(|j| j.get("validationResult"));

    let (valid, status) = match validation_result
        .and_then(|r| r.get("isCompliant"))
        .and_then(Value::as_bool)
    {
        Some(compliant) => (
            compliant,
            if compliant { "compliant" } else { "noncompliant" },
        ),
        // The fallback path is consulted only when validationResult is
        // absent entirely; a present-but-odd validationResult means the
        // schema changed under us and the batch counters cannot be trusted
        // to describe the same thing.
        None if validation_result.is_none() => match batch_verdict(body) {
            Some(true) => (true, "compliant"),
            Some(false) => (false, "noncompliant"),
            None => (false, "unknown"),
        },
        None => (false, "unknown"),
    };

    NormalizedReport {
        valid,
        source_filename,
        produced_at: None,
        status: status.to_string(),
        findings: rule_findings(validation_result),
    }
}

/// Aggregate-counter fallback. `Some(true)` only for the unambiguous
/// single-job success; `None` when the counters are absent.
fn batch_verdict(body: &Value) -> Option<bool> {
    let batch = body.get("batchSummary")?;
    let summary = batch.get("validationSummary").unwrap_or(batch);

    let count = |key: &str| summary.get(key).and_then(Value::as_u64);
    let total = count("totalJobCount")?;
    let compliant = count("compliantPdfaCount")?;
    let failed = count("failedJobCount").unwrap_or(0);
    let failed_to_parse = count("failedToParseCount").unwrap_or(0);

    Some(total == 1 && compliant == 1 && failed == 0 && failed_to_parse == 0)
}

/// Map `validationResult.details.ruleSummaries` into findings, when the
/// report carries them in the expected shape. Findings are informational;
/// the verdict never depends on them.
fn rule_findings(validation_result: Option<&Value>) -> Vec<Finding> {
    let Some(rules) = validation_result
        .and_then(|r| r.get("details"))
        .and_then(|d| d.get("ruleSummaries"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    rules
        .iter()
        .map(|rule| {
            let mut attributes = std::collections::BTreeMap::new();
            for key in ["specification", "clause", "testNumber", "status"] {
                if let Some(v) = rule.get(key).and_then(Value::as_str) {
                    attributes.insert(key.to_string(), v.to_string());
                }
            }
            if let Some(n) = rule.get("failedChecks").and_then(Value::as_u64) {
                attributes.insert("failedChecks".into(), n.to_string());
            }
            Finding {
                kind: "rule".into(),
                attributes,
                message: rule
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim()
                    .to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_compliant_true_is_authoritative() {
        let v = json!({
            "report": {
                "jobs": [{
                    "itemDetails": { "name": "doc.pdf" },
                    "validationResult": { "isCompliant": true }
                }],
                // Contradictory counters must not override the primary path.
                "batchSummary": { "validationSummary": {
                    "totalJobCount": 3, "compliantPdfaCount": 0, "failedJobCount": 3
                }}
            }
        });
        let report = parse_conformance_report(&v);
        assert!(report.valid);
        assert_eq!(report.status, "compliant");
        assert_eq!(report.source_filename.as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn is_compliant_false() {
        let v = json!({ "jobs": [{ "validationResult": { "isCompliant": false } }] });
        let report = parse_conformance_report(&v);
        assert!(!report.valid);
        assert_eq!(report.status, "noncompliant");
    }

    #[test]
    fn wrapper_is_optional() {
        let wrapped = json!({ "report": { "jobs": [{ "validationResult": { "isCompliant": true } }] } });
        let bare = json!({ "jobs": [{ "validationResult": { "isCompliant": true } }] });
        assert!(parse_conformance_report(&wrapped).valid);
        assert!(parse_conformance_report(&bare).valid);
    }

    #[test]
    fn batch_summary_fallback_single_compliant_job() {
        let v = json!({ "batchSummary": { "validationSummary": {
            "totalJobCount": 1, "compliantPdfaCount": 1, "failedJobCount": 0
        }}});
        assert!(parse_conformance_report(&v).valid);
    }

    #[test]
    fn batch_summary_flips_on_any_violated_counter() {
        for (total, compliant, failed) in [(2, 1, 0), (1, 0, 0), (1, 1, 1)] {
            let v = json!({ "batchSummary": { "validationSummary": {
                "totalJobCount": total,
                "compliantPdfaCount": compliant,
                "failedJobCount": failed
            }}});
            let report = parse_conformance_report(&v);
            assert!(
                !report.valid,
                "counters ({total},{compliant},{failed}) must not pass"
            );
        }
    }

    #[test]
    fn batch_summary_parse_failures_flip_the_verdict() {
        let v = json!({ "batchSummary": { "validationSummary": {
            "totalJobCount": 1, "compliantPdfaCount": 1,
            "failedJobCount": 0, "failedToParseCount": 1
        }}});
        assert!(!parse_conformance_report(&v).valid);
    }

    #[test]
    fn counters_read_directly_from_batch_summary_without_wrapper() {
        let v = json!({ "batchSummary": {
            "totalJobCount": 1, "compliantPdfaCount": 1, "failedJobCount": 0
        }});
        assert!(parse_conformance_report(&v).valid);
    }

    #[test]
    fn unrecognisable_shapes_degrade_to_unknown() {
        for v in [json!({}), json!([1, 2, 3]), json!("text"), json!(null)] {
            let report = parse_conformance_report(&v);
            assert!(!report.valid);
            assert_eq!(report.status, "unknown");
        }
    }

    #[test]
    fn odd_is_compliant_type_does_not_fall_back_to_counters() {
        // validationResult present but isCompliant is a string: schema
        // drift. The counters must not rescue the verdict.
        let v = json!({
            "jobs": [{ "validationResult": { "isCompliant": "true" } }],
            "batchSummary": { "validationSummary": {
                "totalJobCount": 1, "compliantPdfaCount": 1, "failedJobCount": 0
            }}
        });
        let report = parse_conformance_report(&v);
        assert!(!report.valid);
        assert_eq!(report.status, "unknown");
    }

    #[test]
    fn rule_summaries_become_findings() {
        let v = json!({ "jobs": [{ "validationResult": {
            "isCompliant": false,
            "details": { "ruleSummaries": [{
                "specification": "ISO 19005-3:2012",
                "clause": "6.1.2",
                "status": "FAILED",
                "failedChecks": 4,
                "description": "file header shall begin at byte offset 0"
            }]}
        }}]});
        let report = parse_conformance_report(&v);
        assert_eq!(report.findings.len(), 1);
        let f = &report.findings[0];
        assert_eq!(f.kind, "rule");
        assert_eq!(f.attributes["clause"], "6.1.2");
        assert_eq!(f.attributes["failedChecks"], "4");
        assert!(f.message.contains("byte offset 0"));
    }
}
