use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::Mutex;

/// StorageError
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("a file named {0:?} already exists")]
    AlreadyExists(String),
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("simulated storage failure")]
    Simulated,
}

/// StoredFile
///
/// Where a saved upload ended up. `file_name` is the name on disk
/// (`<unix-millis>-<sanitized original>`); `file_path` is the full location recorded in
/// the documents table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub file_path: String,
}

// 1. StorageService Contract
/// StorageService
///
/// The contract for document blob storage. Handlers only see this trait, so the disk
/// implementation can be swapped for the in-memory mock in tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Writes a new file derived from the uploaded `original_name`. Existing files are
    /// never overwritten.
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError>;

    async fn read(&self, file_path: &str) -> Result<Vec<u8>, StorageError>;

    /// Renames a file within its own directory and returns the new full path.
    async fn rename(&self, file_path: &str, new_name: &str) -> Result<String, StorageError>;

    async fn delete(&self, file_path: &str) -> Result<(), StorageError>;
}

/// sanitize_file_name
///
/// Reduces a client-supplied name to a single safe path segment: directory components
/// (either separator), `.` and `..` are dropped and only the last segment is kept.
/// Control characters are removed. Fails when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Result<String, StorageError> {
    let segment = name
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .last()
        .unwrap_or_default();

    let cleaned: String = segment.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(cleaned.to_string())
}

fn stamped_name(original_name: &str) -> Result<String, StorageError> {
    let sanitized = sanitize_file_name(original_name)?;
    Ok(format!("{}-{}", Utc::now().timestamp_millis(), sanitized))
}

// 2. The Real Implementation (local filesystem)
/// DiskStorage
///
/// Stores documents as plain files in a single directory (`UPLOAD_DIR`).
#[derive(Clone, Debug)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directory if it is missing. Called once at startup.
    pub async fn ensure_root_exists(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    // Only paths inside the root are ever touched.
    fn resolve(&self, file_path: &str) -> Result<PathBuf, StorageError> {
        let file_name = Path::new(file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::InvalidName(file_path.to_string()))?;
        Ok(self.root.join(sanitize_file_name(file_name)?))
    }
}

fn not_found_or_io(e: io::Error, file_path: &str) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(file_path.to_string())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl StorageService for DiskStorage {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        use tokio::io::AsyncWriteExt;

        let file_name = stamped_name(original_name)?;
        let path = self.root.join(&file_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "document stored");

        Ok(StoredFile {
            file_name,
            file_path: path.to_string_lossy().into_owned(),
        })
    }

    async fn read(&self, file_path: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(file_path)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(e, file_path))
    }

    async fn rename(&self, file_path: &str, new_name: &str) -> Result<String, StorageError> {
        let from = self.resolve(file_path)?;
        let to = self.root.join(sanitize_file_name(new_name)?);

        if from != to && tokio::fs::try_exists(&to).await? {
            return Err(StorageError::AlreadyExists(new_name.to_string()));
        }

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| not_found_or_io(e, file_path))?;

        Ok(to.to_string_lossy().into_owned())
    }

    async fn delete(&self, file_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(file_path)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(e, file_path))
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory `StorageService` for handler tests. Files live in a map keyed by path
/// under a fake `mock-uploads/` root.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

const MOCK_ROOT: &str = "mock-uploads";

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds a file, as if it had been uploaded earlier. Returns its path.
    pub async fn insert(&self, file_name: &str, bytes: &[u8]) -> String {
        let path = format!("{MOCK_ROOT}/{file_name}");
        self.files.lock().await.insert(path.clone(), bytes.to_vec());
        path
    }

    pub async fn contains(&self, file_path: &str) -> bool {
        self.files.lock().await.contains_key(file_path)
    }

    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        self.check()?;
        let file_name = stamped_name(original_name)?;
        let file_path = self.insert(&file_name, bytes).await;
        Ok(StoredFile {
            file_name,
            file_path,
        })
    }

    async fn read(&self, file_path: &str) -> Result<Vec<u8>, StorageError> {
        self.check()?;
        self.files
            .lock()
            .await
            .get(file_path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file_path.to_string()))
    }

    async fn rename(&self, file_path: &str, new_name: &str) -> Result<String, StorageError> {
        self.check()?;
        let new_path = format!("{MOCK_ROOT}/{}", sanitize_file_name(new_name)?);
        let mut files = self.files.lock().await;
        if !files.contains_key(file_path) {
            return Err(StorageError::NotFound(file_path.to_string()));
        }
        if new_path != file_path && files.contains_key(&new_path) {
            return Err(StorageError::AlreadyExists(new_name.to_string()));
        }
        let bytes = files
            .remove(file_path)
            .ok_or_else(|| StorageError::NotFound(file_path.to_string()))?;
        files.insert(new_path.clone(), bytes);
        Ok(new_path)
    }

    async fn delete(&self, file_path: &str) -> Result<(), StorageError> {
        self.check()?;
        self.files
            .lock()
            .await
            .remove(file_path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(file_path.to_string()))
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
