//! Tool version discovery for the diagnostics endpoint.
//!
//! Two sources, in order: a build-time tag file configured per tool
//! (written by the container build, free to read), else the tool's own
//! `--version` output under a short timeout. A tool that answers with
//! nothing usable is reported as `"unavailable"` — the endpoint itself
//! never fails because of a broken tool; surfacing the breakage is its
//! whole job.

use crate::config::{ServiceConfig, ToolCommand};
use crate::runner::{self, ExitKind, InvocationSpec};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::time::Duration;

const UNAVAILABLE: &str = "unavailable";

/// Identifying string per tool, probed concurrently.
pub async fn probe(config: &ServiceConfig) -> BTreeMap<String, String> {
    let probes = [
        ("mustang", &config.mustang),
        ("ghostscript", &config.ghostscript),
        ("verapdf", &config.verapdf),
    ];

    join_all(
        probes
            .into_iter()
            .map(|(name, cmd)| probe_one(config, name, cmd)),
    )
    .await
    .into_iter()
    .collect()
}

async fn probe_one(config: &ServiceConfig, name: &str, cmd: &ToolCommand) -> (String, String) {
    if let Some((_, path)) = config.version_tag_files.iter().find(|(tool, _)| tool == name) {
        if let Ok(tag) = tokio::fs::read_to_string(path).await {
            let tag = tag.trim();
            if !tag.is_empty() {
                return (name.to_string(), tag.to_string());
            }
        }
    }

    let spec = InvocationSpec::new(
        name,
        cmd,
        ["--version".to_string()],
        Duration::from_secs(config.version_probe_timeout_secs),
        16 * 1024,
    );

    let version = match runner::run(&spec).await {
        Ok(result) if matches!(result.exit, ExitKind::Completed(_)) => {
            // Ghostscript prints to stdout, the JVM to stderr.
            first_nonempty_line(&result.stdout)
                .or_else(|| first_nonempty_line(&result.stderr))
                .unwrap_or_else(|| UNAVAILABLE.to_string())
        }
        _ => UNAVAILABLE.to_string(),
    };
    (name.to_string(), version)
}

fn first_nonempty_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
