use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use system::uuid::Uuid;
use system::SessionCode;
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::StoreError;

const EXTENSION: &str = "dcv";

/// Byte-level storage for persisted canvases, keyed by session code.
#[async_trait]
pub trait CanvasStore: Send + Sync {
    async fn put(&self, code: &SessionCode, bytes: Vec<u8>) -> Result<(), StoreError>;
    async fn get(&self, code: &SessionCode) -> Result<Vec<u8>, StoreError>;
    async fn list_codes(&self) -> Result<Vec<SessionCode>, StoreError>;
}

/// One `<CODE>.dcv` file per canvas inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed. Failing here means the process can't persist anything.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        log::info!("Canvas files are stored in {}", dir.display());
        Ok(Self { dir })
    }

    fn file_name(&self, code: &SessionCode) -> PathBuf {
        self.dir.join(format!("{}.{}", code, EXTENSION))
    }
}

#[async_trait]
impl CanvasStore for FileStore {
    async fn put(&self, code: &SessionCode, bytes: Vec<u8>) -> Result<(), StoreError> {
        let file_name = self.file_name(code);
        // Unique per write so concurrent puts of one code never share a temp file.
        let tmp_name = file_name.with_extension(format!("{}.{}.tmp", EXTENSION, Uuid::new_v4()));
        fs::write(&tmp_name, bytes).await?;
        fs::rename(&tmp_name, &file_name).await?;
        Ok(())
    }

    async fn get(&self, code: &SessionCode) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.file_name(code)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::Missing(code.clone())),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_codes(&self) -> Result<Vec<SessionCode>, StoreError> {
        let mut result = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = match entry.file_name().into_string() {
                Ok(file_name) => file_name,
                Err(_) => continue,
            };
            if let Some(code) = file_name
                .strip_suffix(EXTENSION)
                .and_then(|stem| stem.strip_suffix('.'))
                .and_then(SessionCode::parse)
            {
                result.push(code);
            }
        }
        result.sort();
        Ok(result)
    }
}

/// Keeps everything in memory. Used by tests and throwaway servers.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<SessionCode, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CanvasStore for MemoryStore {
    async fn put(&self, code: &SessionCode, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().await.insert(code.clone(), bytes);
        Ok(())
    }

    async fn get(&self, code: &SessionCode) -> Result<Vec<u8>, StoreError> {
        self.entries
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::Missing(code.clone()))
    }

    async fn list_codes(&self) -> Result<Vec<SessionCode>, StoreError> {
        let mut codes: Vec<_> = self.entries.read().await.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }
}
