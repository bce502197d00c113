//! Invoice validation via Mustang's `validate` action.

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::report::extract::extract_xml_payload;
use crate::report::mustang::{parse_validation_report, VALIDATION_CLOSING_TAG};
use crate::report::verdict::DIAGNOSTIC_TAIL_BYTES;
use crate::report::NormalizedReport;
use crate::runner::{self, InvocationSpec};
use crate::workspace::Workspace;
use std::time::Duration;
use tracing::{debug, info};

/// Validate an e-invoice XML document.
///
/// Mustang exits nonzero for invalid invoices, so the exit code is ignored
/// (short of timeout/not-found) and the embedded XML report decides. The
/// report normally arrives on stdout with log4j noise around it; stderr is
/// scanned as a fallback because some tool versions route their output
/// differently and the extra scan costs nothing.
pub async fn validate_invoice(
    config: &ServiceConfig,
    invoice_xml: &[u8],
) -> Result<NormalizedReport, GatewayError> {
    let ws = Workspace::acquire()?;
    let input = ws.write_input("invoice.xml", invoice_xml).await?;

    let spec = InvocationSpec::new(
        "mustang",
        &config.mustang,
        [
            "--action".to_string(),
            "validate".to_string(),
            "--source".to_string(),
            input.to_string_lossy().into_owned(),
            "--no-notices".to_string(),
        ],
        Duration::from_secs(config.mustang_timeout_secs),
        config.capture_cap_bytes,
    );

    let result = runner::run(&spec).await?;
    super::require_answered("mustang", config.mustang_timeout_secs, &result)?;

    let payload = extract_xml_payload(&result.stdout, VALIDATION_CLOSING_TAG)
        .or_else(|| extract_xml_payload(&result.stderr, VALIDATION_CLOSING_TAG));

    let Some(payload) = payload else {
        debug!(
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "No validation report found in tool output"
        );
        let (stdout_tail, stderr_tail) = result.tails(DIAGNOSTIC_TAIL_BYTES);
        return Err(GatewayError::ReportExtractionFailed {
            tool: "mustang".into(),
            stdout_tail,
            stderr_tail,
        });
    };

    let report = parse_validation_report(payload)?;
    info!(
        valid = report.valid,
        status = %report.status,
        findings = report.findings.len(),
        "Invoice validated"
    );
    Ok(report)
}
