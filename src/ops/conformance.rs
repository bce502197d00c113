//! PDF/A conformance checking via veraPDF.

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::report::extract::extract_json_payload;
use crate::report::verapdf::parse_conformance_report;
use crate::report::verdict::DIAGNOSTIC_TAIL_BYTES;
use crate::report::NormalizedReport;
use crate::runner::{self, InvocationSpec};
use crate::workspace::Workspace;
use std::time::Duration;
use tracing::info;

/// Run veraPDF against the posted PDF and normalize its JSON report.
///
/// Like the invoice validator, a nonzero exit is routine (veraPDF exits
/// nonzero for noncompliant files). Unlike the XML path, the report must
/// be the *entire* stdout — veraPDF writes clean JSON there — so there is
/// no substring scan; any stray log line means extraction failed.
pub async fn check_conformance(
    config: &ServiceConfig,
    pdf: &[u8],
) -> Result<NormalizedReport, GatewayError> {
    let ws = Workspace::acquire()?;
    let input = ws.write_input("in.pdf", pdf).await?;

    let spec = InvocationSpec::new(
        "verapdf",
        &config.verapdf,
        [
            "--format".to_string(),
            "json".to_string(),
            input.to_string_lossy().into_owned(),
        ],
        Duration::from_secs(config.verapdf_timeout_secs),
        config.capture_cap_bytes,
    );

    let result = runner::run(&spec).await?;
    super::require_answered("verapdf", config.verapdf_timeout_secs, &result)?;

    let Some(value) = extract_json_payload(&result.stdout) else {
        let (stdout_tail, stderr_tail) = result.tails(DIAGNOSTIC_TAIL_BYTES);
        return Err(GatewayError::ReportExtractionFailed {
            tool: "verapdf".into(),
            stdout_tail,
            stderr_tail,
        });
    };

    let report = parse_conformance_report(&value);
    info!(
        valid = report.valid,
        status = %report.status,
        "PDF/A conformance checked"
    );
    Ok(report)
}
