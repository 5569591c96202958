//! Opaque evidence blob storage.
//!
//! The core never interprets evidence bytes; it stores them under a generated
//! name and hands back that name as the proof's evidence reference.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::crypto;
use crate::store::{CoreError, Result};

/// External collaborator interface: opaque byte storage addressed by a
/// generated name.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store `bytes` and return the generated storage name.
    async fn store(&self, public_id: &str, original_name: &str, bytes: &[u8]) -> Result<String>;

    /// Load previously stored bytes by name.
    async fn load(&self, name: &str) -> Result<Vec<u8>>;
}

/// Filesystem-backed evidence store.
///
/// Names are `<public_id>-<content digest prefix>-<sanitized original name>`,
/// flat under one root directory.
pub struct FsEvidenceStore {
    root: PathBuf,
}

impl FsEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn store(&self, public_id: &str, original_name: &str, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Internal(format!("evidence dir: {e}")))?;

        let digest = crypto::sha256_hex(bytes);
        let name = format!(
            "{public_id}-{}-{}",
            &digest[..10],
            sanitize_file_name(original_name)
        );

        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("evidence write: {e}")))?;

        tracing::debug!(name = %name, size = bytes.len(), "evidence stored");
        Ok(name)
    }

    async fn load(&self, name: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::EvidenceNotFound(name.to_string()))
            }
            Err(e) => Err(CoreError::Internal(format!("evidence read: {e}"))),
        }
    }
}

/// Restrict a client-supplied file name to a safe character set.
fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.is_empty() {
        "upload".to_string()
    } else {
        safe
    }
}
