//! Diagram generation via Mustang's `generate` action.

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::runner::{self, InvocationSpec};
use crate::workspace::Workspace;
use std::time::Duration;
use tracing::info;

/// Render the posted source into a PNG diagram.
///
/// Success requires both a zero exit and a non-empty output file — the
/// tool has been observed exiting 0 after writing nothing.
pub async fn generate(config: &ServiceConfig, source: &[u8]) -> Result<Vec<u8>, GatewayError> {
    let ws = Workspace::acquire()?;
    let input = ws.write_input("Input.java", source).await?;
    let output = ws.file("diagram.png");

    let spec = InvocationSpec::new(
        "mustang",
        &config.mustang,
        [
            "generate".to_string(),
            input.to_string_lossy().into_owned(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
        ],
        Duration::from_secs(config.mustang_timeout_secs),
        config.capture_cap_bytes,
    );

    let result = runner::run(&spec).await?;
    super::require_success("mustang", config.mustang_timeout_secs, &result)?;

    let png = super::read_artifact("mustang", &output).await?;
    info!(bytes = png.len(), "Diagram generated");
    Ok(png)
}
