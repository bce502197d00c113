//! Process-wide configuration for the gateway.
//!
//! Everything the service needs to know at runtime — which command line
//! launches each external tool, how long each tool may run, the optional
//! bearer token — lives in one immutable [`ServiceConfig`], constructed once
//! at startup and passed by `Arc` into every handler. No global mutable
//! state: two requests can never observe different configurations.
//!
//! # Design choice: builder over constructor
//! Most deployments override two or three fields (jar path, token) and keep
//! the rest at defaults taken from the reference deployment. The builder
//! lets callers say only what differs.

use crate::error::GatewayError;
use std::path::PathBuf;

/// How to launch one external tool: the program plus any fixed leading
/// arguments (e.g. `java -jar /opt/mustang/Mustang-CLI.jar`).
///
/// Per-invocation arguments are appended after `leading_args` by the
/// operation that issues the call.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Executable name or path, resolved via `PATH` when bare.
    pub program: String,
    /// Arguments always passed before the operation-specific ones.
    pub leading_args: Vec<String>,
}

impl ToolCommand {
    /// A plain executable with no fixed arguments.
    pub fn bare(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// A jar launched through the JVM.
    pub fn jar(java: impl Into<String>, jar_path: impl Into<String>) -> Self {
        Self {
            program: java.into(),
            leading_args: vec!["-jar".into(), jar_path.into()],
        }
    }
}

/// Immutable gateway configuration.
///
/// Built via [`ServiceConfig::builder()`] or [`ServiceConfig::default()`].
///
/// # Example
/// ```rust
/// use facturx_gateway::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .mustang_jar("/opt/mustang/Mustang-CLI-2.16.4.jar")
///     .auth_token("s3cret")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Command line for Mustang CLI (diagram generation, XML embedding,
    /// invoice validation). Default: `java -jar /opt/mustang/Mustang-CLI-2.16.4.jar`.
    pub mustang: ToolCommand,

    /// Command line for Ghostscript (PDF → PDF/A-3). Default: `gs`.
    pub ghostscript: ToolCommand,

    /// Command line for veraPDF (PDF/A conformance checking). Default: `verapdf`.
    pub verapdf: ToolCommand,

    /// Wall-clock budget for diagram generation and invoice validation,
    /// in seconds. Default: 60.
    pub mustang_timeout_secs: u64,

    /// Wall-clock budget for Ghostscript conversion and XML embedding,
    /// in seconds. Default: 120.
    ///
    /// Conversion rewrites every page; large scanned documents routinely
    /// need more than the 60 s that suffices for validation.
    pub convert_timeout_secs: u64,

    /// Wall-clock budget for a veraPDF conformance run, in seconds. Default: 60.
    pub verapdf_timeout_secs: u64,

    /// Budget for a `--version` probe on the diagnostics endpoint, in
    /// seconds. Default: 5.
    ///
    /// Version probes must never hold a diagnostics request hostage to a
    /// wedged tool; anything slower than this is reported "unavailable".
    pub version_probe_timeout_secs: u64,

    /// Per-stream capture cap in bytes; the *tail* is kept when a child
    /// exceeds it. Default: 256 KiB.
    ///
    /// The interesting part of tool output (the embedded report, the final
    /// error) is at the end. Keeping the tail preserves it while bounding
    /// memory against a child that logs without limit.
    pub capture_cap_bytes: usize,

    /// Bearer token required on data endpoints. `None` disables the check
    /// (local development). Compared in constant time.
    pub auth_token: Option<String>,

    /// Optional build-time tag file per tool, read by `/versions` instead of
    /// invoking the tool. Keys: `"mustang"`, `"ghostscript"`, `"verapdf"`.
    pub version_tag_files: Vec<(String, PathBuf)>,

    /// Default ZUGFeRD format for `/embed_xml` (`zf` or `fx`). Default: `zf`.
    pub default_zugferd_format: String,

    /// Default ZUGFeRD version for `/embed_xml`. Default: `2`.
    pub default_zugferd_version: String,

    /// Default ZUGFeRD profile for `/embed_xml`. Default: `XRechnung`.
    ///
    /// Profile names are case-sensitive on the Mustang side; the default is
    /// the profile mandated for invoices to German public-sector buyers.
    pub default_zugferd_profile: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            mustang: ToolCommand::jar("java", "/opt/mustang/Mustang-CLI-2.16.4.jar"),
            ghostscript: ToolCommand::bare("gs"),
            verapdf: ToolCommand::bare("verapdf"),
            mustang_timeout_secs: 60,
            convert_timeout_secs: 120,
            verapdf_timeout_secs: 60,
            version_probe_timeout_secs: 5,
            capture_cap_bytes: 256 * 1024,
            auth_token: None,
            version_tag_files: Vec::new(),
            default_zugferd_format: "zf".into(),
            default_zugferd_version: "2".into(),
            default_zugferd_profile: "XRechnung".into(),
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Launch Mustang from this jar (keeps `java -jar`).
    pub fn mustang_jar(mut self, jar_path: impl Into<String>) -> Self {
        self.config.mustang = ToolCommand::jar("java", jar_path);
        self
    }

    pub fn mustang(mut self, cmd: ToolCommand) -> Self {
        self.config.mustang = cmd;
        self
    }

    pub fn ghostscript(mut self, cmd: ToolCommand) -> Self {
        self.config.ghostscript = cmd;
        self
    }

    pub fn verapdf(mut self, cmd: ToolCommand) -> Self {
        self.config.verapdf = cmd;
        self
    }

    pub fn mustang_timeout_secs(mut self, secs: u64) -> Self {
        self.config.mustang_timeout_secs = secs.max(1);
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs.max(1);
        self
    }

    pub fn verapdf_timeout_secs(mut self, secs: u64) -> Self {
        self.config.verapdf_timeout_secs = secs.max(1);
        self
    }

    pub fn version_probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.version_probe_timeout_secs = secs.max(1);
        self
    }

    pub fn capture_cap_bytes(mut self, bytes: usize) -> Self {
        self.config.capture_cap_bytes = bytes.max(1024);
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = Some(token.into());
        self
    }

    pub fn version_tag_file(mut self, tool: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.config
            .version_tag_files
            .push((tool.into(), path.into()));
        self
    }

    pub fn default_zugferd_format(mut self, fmt: impl Into<String>) -> Self {
        self.config.default_zugferd_format = fmt.into();
        self
    }

    pub fn default_zugferd_version(mut self, ver: impl Into<String>) -> Self {
        self.config.default_zugferd_version = ver.into();
        self
    }

    pub fn default_zugferd_profile(mut self, profile: impl Into<String>) -> Self {
        self.config.default_zugferd_profile = profile.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, GatewayError> {
        let c = &self.config;
        if c.mustang.program.is_empty()
            || c.ghostscript.program.is_empty()
            || c.verapdf.program.is_empty()
        {
            return Err(GatewayError::Internal(
                "Tool program names must be non-empty".into(),
            ));
        }
        if let Some(token) = &c.auth_token {
            if token.is_empty() {
                return Err(GatewayError::Internal(
                    "Auth token, when set, must be non-empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tool_commands() {
        let c = ServiceConfig::default();
        assert_eq!(c.mustang.program, "java");
        assert_eq!(c.mustang.leading_args[0], "-jar");
        assert_eq!(c.ghostscript.program, "gs");
        assert!(c.ghostscript.leading_args.is_empty());
        assert!(c.auth_token.is_none());
    }

    #[test]
    fn builder_overrides() {
        let c = ServiceConfig::builder()
            .mustang_jar("/srv/Mustang.jar")
            .auth_token("t0ken")
            .convert_timeout_secs(30)
            .build()
            .unwrap();
        assert!(c.mustang.leading_args.contains(&"/srv/Mustang.jar".to_string()));
        assert_eq!(c.auth_token.as_deref(), Some("t0ken"));
        assert_eq!(c.convert_timeout_secs, 30);
    }

    #[test]
    fn empty_token_rejected() {
        let err = ServiceConfig::builder().auth_token("").build();
        assert!(err.is_err());
    }

    #[test]
    fn timeouts_clamped_to_at_least_one_second() {
        let c = ServiceConfig::builder()
            .mustang_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.mustang_timeout_secs, 1);
    }
}
