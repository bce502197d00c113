//! # facturx-gateway
//!
//! HTTP gateway exposing document-processing capabilities — diagram
//! generation, PDF → PDF/A-3 conversion, ZUGFeRD/Factur-X e-invoice
//! embedding, and dual-format validation — each backed by an external
//! command-line tool (Mustang CLI, Ghostscript, veraPDF).
//!
//! ## Why a gateway?
//!
//! The tools that actually understand e-invoice formats are mature JVM and
//! C programs with file-based CLIs. Rewriting them is a non-goal; the hard
//! and valuable part is wrapping them *safely*: isolating per-request
//! scratch files, enforcing timeouts that kill whole process subtrees,
//! capturing interleaved log-and-payload output without deadlocking, and
//! reconciling two incompatible report schemas into one boolean-verdict
//! contract callers can branch on.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request bytes
//!  │
//!  ├─ 1. Workspace  isolated temp scope, removed on every exit path
//!  ├─ 2. Runner     spawn tool, timeout + group kill, tail-capped capture
//!  ├─ 3. Extract    isolate the report payload from log noise
//!  ├─ 4. Normalize  Mustang XML / veraPDF JSON → {valid, status, findings}
//!  └─ 5. Verdict    200 ok / 422 failed check / 4xx-5xx infrastructure
//! ```
//!
//! Binary endpoints (`/generate`, `/convert_pdfa3`, `/embed_xml`) stop
//! after step 2 and return the produced artifact instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use facturx_gateway::{server, ServiceConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = Arc::new(ServiceConfig::default());
//!     server::serve(config, "0.0.0.0:8080".parse().unwrap()).await
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `facturx-gateway` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ops;
pub mod report;
pub mod runner;
pub mod server;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder, ToolCommand};
pub use error::GatewayError;
pub use report::verdict::Verdict;
pub use report::{Finding, NormalizedReport};
pub use runner::{ExitKind, InvocationResult, InvocationSpec};
pub use workspace::Workspace;
