//! Tool operations: one submodule per external capability.
//!
//! Each operation follows the same sequence — acquire a [`crate::workspace::Workspace`],
//! write the inputs, run the tool through [`crate::runner`], then interpret
//! the outcome. What "success" means differs by tool family:
//!
//! * **artifact tools** ([`diagram`], [`pdfa`], [`embed`]) — nonzero exit is
//!   unambiguously failure, and even a zero exit only counts when the
//!   output file exists and is non-empty;
//! * **report tools** ([`validate`], [`conformance`]) — exit codes are
//!   inconclusive (validators exit nonzero for invalid documents); only a
//!   missing executable or a timeout is an infrastructure failure, and the
//!   embedded report (or its absence) decides everything else.

pub mod conformance;
pub mod diagram;
pub mod embed;
pub mod pdfa;
pub mod validate;
pub mod versions;

use crate::error::GatewayError;
use crate::report::verdict::DIAGNOSTIC_TAIL_BYTES;
use crate::runner::{ExitKind, InvocationResult};
use std::path::Path;

/// Strict interpretation for artifact tools: anything but exit 0 is an
/// error.
pub(crate) fn require_success(
    tool: &str,
    timeout_secs: u64,
    result: &InvocationResult,
) -> Result<(), GatewayError> {
    let (stdout_tail, stderr_tail) = result.tails(DIAGNOSTIC_TAIL_BYTES);
    match result.exit {
        ExitKind::Completed(0) => Ok(()),
        ExitKind::Completed(code) => Err(GatewayError::ToolFailed {
            tool: tool.into(),
            code,
            stdout_tail,
            stderr_tail,
        }),
        ExitKind::TimedOut => Err(GatewayError::ToolTimeout {
            tool: tool.into(),
            secs: timeout_secs,
            stdout_tail,
            stderr_tail,
        }),
        ExitKind::NotFound => Err(GatewayError::ToolNotFound { tool: tool.into() }),
    }
}

/// Lenient interpretation for report tools: only "never answered" counts
/// as an error here. Nonzero exits fall through to report extraction.
pub(crate) fn require_answered(
    tool: &str,
    timeout_secs: u64,
    result: &InvocationResult,
) -> Result<(), GatewayError> {
    match result.exit {
        ExitKind::Completed(_) => Ok(()),
        ExitKind::TimedOut => {
            let (stdout_tail, stderr_tail) = result.tails(DIAGNOSTIC_TAIL_BYTES);
            Err(GatewayError::ToolTimeout {
                tool: tool.into(),
                secs: timeout_secs,
                stdout_tail,
                stderr_tail,
            })
        }
        ExitKind::NotFound => Err(GatewayError::ToolNotFound { tool: tool.into() }),
    }
}

/// Read a produced artifact, requiring it to exist and be non-empty.
pub(crate) async fn read_artifact(tool: &str, path: &Path) -> Result<Vec<u8>, GatewayError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        Ok(_) => Err(GatewayError::OutputMissing { tool: tool.into() }),
        Err(_) => Err(GatewayError::OutputMissing { tool: tool.into() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit: ExitKind) -> InvocationResult {
        InvocationResult {
            exit,
            stdout: "out".into(),
            stderr: "err".into(),
        }
    }

    #[test]
    fn strict_rejects_nonzero_exit() {
        let err = require_success("gs", 120, &result(ExitKind::Completed(1))).unwrap_err();
        assert_eq!(err.tag(), "tool_failed");
        let (o, e) = err.output_tails().unwrap();
        assert_eq!((o, e), ("out", "err"));
    }

    #[test]
    fn lenient_accepts_nonzero_exit() {
        assert!(require_answered("mustang", 60, &result(ExitKind::Completed(12))).is_ok());
    }

    #[test]
    fn both_reject_timeout_and_not_found() {
        assert_eq!(
            require_success("gs", 120, &result(ExitKind::TimedOut))
                .unwrap_err()
                .http_status(),
            504
        );
        assert_eq!(
            require_answered("mustang", 60, &result(ExitKind::TimedOut))
                .unwrap_err()
                .http_status(),
            504
        );
        assert_eq!(
            require_answered("mustang", 60, &result(ExitKind::NotFound))
                .unwrap_err()
                .tag(),
            "tool_not_found"
        );
    }

    #[tokio::test]
    async fn missing_artifact_is_output_missing() {
        let err = read_artifact("gs", Path::new("/nonexistent/out.pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.tag(), "output_missing");
    }
}
