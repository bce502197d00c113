//! ZUGFeRD/Factur-X invoice embedding via Mustang's `combine` action.

use crate::config::ServiceConfig;
use crate::error::GatewayError;
use crate::runner::{self, InvocationSpec};
use crate::workspace::Workspace;
use std::time::Duration;
use tracing::info;

/// ZUGFeRD parameters for one embedding request.
///
/// Defaults come from [`ServiceConfig`]; the profile name is passed through
/// verbatim because Mustang matches it case-sensitively.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// `zf` (ZUGFeRD) or `fx` (Factur-X).
    pub format: String,
    /// ZUGFeRD major version, e.g. `2`.
    pub version: String,
    /// Profile name, e.g. `XRechnung`, `EN16931`, `COMFORT`.
    pub profile: String,
}

impl EmbedOptions {
    pub fn defaults(config: &ServiceConfig) -> Self {
        Self {
            format: config.default_zugferd_format.clone(),
            version: config.default_zugferd_version.clone(),
            profile: config.default_zugferd_profile.clone(),
        }
    }

    /// Download filename encoding the parameters the PDF was built with.
    pub fn suggested_filename(&self) -> String {
        format!(
            "zugferd_fmt-{}_v{}_{}.pdf",
            self.format, self.version, self.profile
        )
    }
}

/// Embed the invoice XML into the PDF, producing a ZUGFeRD/Factur-X PDF.
pub async fn combine(
    config: &ServiceConfig,
    pdf: &[u8],
    xml: &[u8],
    options: &EmbedOptions,
) -> Result<Vec<u8>, GatewayError> {
    let ws = Workspace::acquire()?;
    let pdf_path = ws.write_input("source.pdf", pdf).await?;
    let xml_path = ws.write_input("invoice.xml", xml).await?;
    let output = ws.file("output_with_xml.pdf");

    let spec = InvocationSpec::new(
        "mustang",
        &config.mustang,
        combine_args(&pdf_path, &xml_path, &output, options),
        Duration::from_secs(config.convert_timeout_secs),
        config.capture_cap_bytes,
    );

    let result = runner::run(&spec).await?;
    super::require_success("mustang", config.convert_timeout_secs, &result)?;

    let combined = super::read_artifact("mustang", &output).await?;
    info!(
        format = %options.format,
        version = %options.version,
        profile = %options.profile,
        output_bytes = combined.len(),
        "Invoice embedded"
    );
    Ok(combined)
}

/// Mustang `combine` argument list.
///
/// `--attachments` gets a genuinely empty value to suppress the
/// interactive attachment prompt; Mustang must see an empty list, not a
/// two-character value of literal quote marks.
fn combine_args(
    pdf_path: &std::path::Path,
    xml_path: &std::path::Path,
    output: &std::path::Path,
    options: &EmbedOptions,
) -> Vec<String> {
    vec![
        "--action".to_string(),
        "combine".to_string(),
        "--source".to_string(),
        pdf_path.to_string_lossy().into_owned(),
        "--source-xml".to_string(),
        xml_path.to_string_lossy().into_owned(),
        "--out".to_string(),
        output.to_string_lossy().into_owned(),
        "--format".to_string(),
        options.format.clone(),
        "--version".to_string(),
        options.version.clone(),
        "--profile".to_string(),
        options.profile.clone(),
        "--attachments".to_string(),
        String::new(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn attachments_value_is_empty_not_quote_characters() {
        let opts = EmbedOptions::defaults(&ServiceConfig::default());
        let args = combine_args(
            Path::new("/tmp/a.pdf"),
            Path::new("/tmp/a.xml"),
            Path::new("/tmp/out.pdf"),
            &opts,
        );
        let pos = args.iter().position(|a| a == "--attachments").unwrap();
        assert_eq!(args[pos + 1], "");
    }

    #[test]
    fn suggested_filename_encodes_parameters() {
        let opts = EmbedOptions {
            format: "fx".into(),
            version: "2".into(),
            profile: "EN16931".into(),
        };
        assert_eq!(opts.suggested_filename(), "zugferd_fmt-fx_v2_EN16931.pdf");
    }

    #[test]
    fn defaults_track_config() {
        let config = ServiceConfig::default();
        let opts = EmbedOptions::defaults(&config);
        assert_eq!(opts.format, "zf");
        assert_eq!(opts.version, "2");
        assert_eq!(opts.profile, "XRechnung");
    }
}
