use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::gateway::GatewayResult;
use crate::utils::uploads::sanitize_filename;

/// Where uploaded files end up. Returns the reference the catalog stores.
#[async_trait]
pub trait FileStorage: std::fmt::Debug + Send + Sync {
    async fn save(&self, folder: &str, filename: &str, bytes: &[u8]) -> GatewayResult<String>;
}

/// Stores files under a local directory that the router serves at `public_prefix`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(root: PathBuf, public_prefix: &str) -> Self {
        Self {
            root,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(&self, folder: &str, filename: &str, bytes: &[u8]) -> GatewayResult<String> {
        let folder = sanitize_filename(folder);
        // same client file name uploaded twice must not overwrite the first one
        let stored = format!("{}-{}", Uuid::new_v4().simple(), sanitize_filename(filename));

        let dir = self.root.join(&folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored), bytes).await?;

        tracing::debug!(folder = %folder, file = %stored, size = bytes.len(), "file stored");
        Ok(format!("{}/{}/{}", self.public_prefix, folder, stored))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn local_storage_save_test() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_path_buf(), "/api/v1/static/");

        let reference = storage
            .save("attachments", "../Week 1 notes.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert!(reference.starts_with("/api/v1/static/attachments/"));
        assert!(reference.ends_with("-Week_1_notes.pdf"));

        let stored_name = reference.rsplit('/').next().unwrap();
        let on_disk = temp_dir.path().join("attachments").join(stored_name);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn local_storage_unique_names_test() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_path_buf(), "/static");

        let first = storage.save("videos", "intro.mp4", b"a").await.unwrap();
        let second = storage.save("videos", "intro.mp4", b"b").await.unwrap();
        assert_ne!(first, second);
    }
}
