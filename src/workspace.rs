//! Per-request scratch directories.
//!
//! ## Why a temp directory per request?
//!
//! Every external tool in the fleet takes file-system paths, not byte
//! buffers. Each request therefore gets its own [`tempfile::TempDir`]
//! scope: uniquely named (concurrent requests can never collide) and
//! removed — with all contents — when the [`Workspace`] is dropped, on
//! every exit path including panics mid-handler. No artifact outlives the
//! request that created it.

use crate::error::GatewayError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// An isolated, auto-cleaned filesystem scope for one request.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh empty workspace.
    ///
    /// The only realistic failure here is the temp filesystem being full or
    /// unwritable, which is fatal to the request.
    pub fn acquire() -> Result<Self, GatewayError> {
        let dir = TempDir::new()
            .map_err(|e| GatewayError::Internal(format!("Failed to create workspace: {e}")))?;
        debug!("Workspace acquired: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a named artifact inside the workspace. Nothing is created.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an input artifact and return its path.
    ///
    /// Fails when the bytes are empty — an empty input file would only move
    /// the failure into the tool with a worse message.
    pub async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, GatewayError> {
        if bytes.is_empty() {
            return Err(GatewayError::EmptyPayload { what: name.into() });
        }
        let path = self.file(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| GatewayError::Internal(format!("Failed to write {name}: {e}")))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn workspace_is_removed_on_drop() {
        let ws = Workspace::acquire().unwrap();
        let root = ws.path().to_path_buf();
        ws.write_input("in.bin", b"payload").await.unwrap();
        assert!(root.join("in.bin").exists());
        drop(ws);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn concurrent_workspaces_are_disjoint() {
        let a = Workspace::acquire().unwrap();
        let b = Workspace::acquire().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn empty_input_rejected() {
        let ws = Workspace::acquire().unwrap();
        let err = ws.write_input("in.pdf", b"").await.unwrap_err();
        assert_eq!(err.http_status(), 400);
    }
}
