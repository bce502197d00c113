//! PDF → PDF/A-3 conversion via Ghostscript.

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::runner::{self, InvocationSpec};
use crate::workspace::Workspace;
use std::time::Duration;
use tracing::info;

/// Rewrite `pdf` as PDF/A-3.
///
/// The flag set is the fixed contract with Ghostscript:
/// `-dPDFACompatibilityPolicy=1` keeps the conversion going past
/// constructs that cannot be made conformant (they are dropped, not
/// fatal), and font embedding/subsetting is forced because PDF/A forbids
/// external font references.
pub async fn convert(config: &ServiceConfig, pdf: &[u8]) -> Result<Vec<u8>, GatewayError> {
    let ws = Workspace::acquire()?;
    let input = ws.write_input("in.pdf", pdf).await?;
    let output = ws.file("out_pdfa3.pdf");

    let args = vec![
        "-dPDFA=3".to_string(),
        "-dPDFACompatibilityPolicy=1".to_string(),
        "-dBATCH".to_string(),
        "-dNOPAUSE".to_string(),
        "-sDEVICE=pdfwrite".to_string(),
        "-dEmbedAllFonts=true".to_string(),
        "-dSubsetFonts=true".to_string(),
        "-sProcessColorModel=DeviceRGB".to_string(),
        format!("-sOutputFile={}", output.to_string_lossy()),
        input.to_string_lossy().into_owned(),
    ];

    let spec = InvocationSpec::new(
        "ghostscript",
        &config.ghostscript,
        args,
        Duration::from_secs(config.convert_timeout_secs),
        config.capture_cap_bytes,
    );

    let result = runner::run(&spec).await?;
    super::require_success("ghostscript", config.convert_timeout_secs, &result)?;

    let converted = super::read_artifact("ghostscript", &output).await?;
    info!(
        input_bytes = pdf.len(),
        output_bytes = converted.len(),
        "PDF/A-3 conversion finished"
    );
    Ok(converted)
}
