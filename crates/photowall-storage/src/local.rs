use crate::error::{StorageError, StorageResult};
use photowall_core::models::{DerivedKind, SUPPORTED_EXTENSIONS};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const STAGING_PREFIX: &str = ".upload-";
const STAGING_SUFFIX: &str = ".partial";
const COPY_BUF_LEN: usize = 64 * 1024;

/// Upload content written to a hidden temporary file, waiting for its final name.
///
/// Dropping a `StagedFile` that was never persisted removes the temporary file.
pub struct StagedFile {
    path: Option<TempPath>,
    size: u64,
}

impl StagedFile {
    /// Number of bytes written.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether the content has already been moved to its final name.
    pub fn is_persisted(&self) -> bool {
        self.path.is_none()
    }
}

/// Local filesystem asset store
#[derive(Clone, Debug)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    /// Create the store and its directory layout.
    ///
    /// Directory creation is idempotent. A failure is logged, not returned: later
    /// operations fail individually with a visible error instead.
    ///
    /// # Arguments
    /// * `root` - Directory holding originals (e.g. "media")
    /// * `with_derived_dirs` - Also create the thumbnail and preview subdirectories
    pub async fn new(root: impl Into<PathBuf>, with_derived_dirs: bool) -> Self {
        let store = LocalAssetStore { root: root.into() };

        let mut dirs = vec![store.root.clone()];
        if with_derived_dirs {
            dirs.extend(DerivedKind::ALL.iter().map(|kind| store.derived_dir(*kind)));
        }

        for dir in dirs {
            if let Err(e) = fs::create_dir_all(&dir).await {
                tracing::error!(
                    error = %e,
                    path = %dir.display(),
                    "Failed to create storage directory"
                );
            }
        }

        store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn derived_dir(&self, kind: DerivedKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Reject names that could escape the storage directories or collide with staging files.
    fn validate_filename(filename: &str) -> StorageResult<()> {
        if filename.is_empty()
            || filename.starts_with('.')
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
            || filename.contains('\0')
        {
            return Err(StorageError::InvalidKey(filename.to_string()));
        }
        Ok(())
    }

    pub fn original_path(&self, filename: &str) -> StorageResult<PathBuf> {
        Self::validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    pub fn derived_path(&self, kind: DerivedKind, filename: &str) -> StorageResult<PathBuf> {
        Self::validate_filename(filename)?;
        Ok(self.derived_dir(kind).join(filename))
    }

    /// Enumerate stored originals. Order is whatever the filesystem returns.
    pub async fn list_originals(&self) -> StorageResult<Vec<String>> {
        let names = Self::list_dir(&self.root).await.map_err(|e| match e {
            StorageError::NotFound(dir) => {
                StorageError::ReadFailed(format!("Storage directory {} does not exist", dir))
            }
            other => other,
        })?;
        Ok(names.into_iter().filter(|n| is_listable(n)).collect())
    }

    /// Names present in a derived-asset directory. A missing directory is an empty set.
    pub async fn list_derived(&self, kind: DerivedKind) -> StorageResult<HashSet<String>> {
        match Self::list_dir(&self.derived_dir(kind)).await {
            Ok(names) => Ok(names.into_iter().filter(|n| !n.starts_with('.')).collect()),
            Err(StorageError::NotFound(_)) => Ok(HashSet::new()),
            Err(e) => Err(e),
        }
    }

    async fn list_dir(dir: &Path) -> StorageResult<Vec<String>> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(dir.display().to_string())
            } else {
                StorageError::ReadFailed(format!(
                    "Failed to read directory {}: {}",
                    dir.display(),
                    e
                ))
            }
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read directory {}: {}", dir.display(), e))
        })? {
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                // Removed between readdir and stat.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StorageError::ReadFailed(format!(
                        "Failed to stat {}: {}",
                        entry.path().display(),
                        e
                    )))
                }
            };
            if file_type.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    /// Write a stream to a hidden temporary file under the root.
    pub async fn stage<R>(&self, reader: &mut R) -> StorageResult<StagedFile>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let start = std::time::Instant::now();

        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.root)
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create staging file in {}: {}",
                    self.root.display(),
                    e
                ))
            })?;
        let (file, path) = named.into_parts();
        let mut file = fs::File::from_std(file);

        // Read and write errors are kept apart: the first is the client's, the second ours.
        let mut buf = vec![0u8; COPY_BUF_LEN];
        let mut size: u64 = 0;
        loop {
            let n = reader.read(&mut buf).await.map_err(StorageError::SourceFailed)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to write stream to {}: {}",
                    path.display(),
                    e
                ))
            })?;
            size += n as u64;
        }

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload staged"
        );

        Ok(StagedFile {
            path: Some(path),
            size,
        })
    }

    /// Move staged content to `filename` under the root.
    ///
    /// With `overwrite == false` an existing original is never replaced and
    /// `StorageError::AlreadyExists` is returned; the staged file stays usable so the
    /// caller can retry under another name.
    pub async fn persist_staged(
        &self,
        staged: &mut StagedFile,
        filename: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        let target = self.original_path(filename)?;
        let temp = staged.path.take().ok_or_else(|| {
            StorageError::WriteFailed("Staged file was already persisted".to_string())
        })?;

        match persist(temp, target.clone(), overwrite).await {
            Ok(()) => {
                tracing::info!(
                    path = %target.display(),
                    filename = %filename,
                    size_bytes = staged.size,
                    "Original stored"
                );
                Ok(())
            }
            Err((error, temp)) => {
                staged.path = temp;
                if error.kind() == io::ErrorKind::AlreadyExists {
                    Err(StorageError::AlreadyExists(filename.to_string()))
                } else {
                    Err(StorageError::WriteFailed(format!(
                        "Failed to move upload to {}: {}",
                        target.display(),
                        error
                    )))
                }
            }
        }
    }

    /// Create-or-truncate write of an original from a stream. Returns the byte count.
    pub async fn save_original<R>(&self, reader: &mut R, filename: &str) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        Self::validate_filename(filename)?;
        let mut staged = self.stage(reader).await?;
        self.persist_staged(&mut staged, filename, true).await?;
        Ok(staged.size())
    }

    pub async fn read_original(&self, filename: &str) -> StorageResult<Vec<u8>> {
        let path = self.original_path(filename)?;
        fs::read(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(filename.to_string())
            } else {
                StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
            }
        })
    }

    /// Replace a derived asset by full overwrite.
    pub async fn write_derived(
        &self,
        kind: DerivedKind,
        filename: &str,
        data: &[u8],
    ) -> StorageResult<()> {
        let target = self.derived_path(kind, filename)?;
        let dir = self.derived_dir(kind);
        fs::create_dir_all(&dir).await?;

        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create staging file in {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        let (file, temp) = named.into_parts();
        let mut file = fs::File::from_std(file);

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", temp.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", temp.display(), e))
        })?;
        drop(file);

        persist(temp, target.clone(), true)
            .await
            .map_err(|(e, _)| {
                StorageError::WriteFailed(format!(
                    "Failed to move {} into place: {}",
                    target.display(),
                    e
                ))
            })?;

        tracing::debug!(
            path = %target.display(),
            kind = %kind,
            size_bytes = data.len(),
            "Derived asset written"
        );

        Ok(())
    }

    /// Remove an original. Derived assets are left in place.
    pub async fn delete(&self, filename: &str) -> StorageResult<()> {
        let path = self.original_path(filename)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), filename = %filename, "Original deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub async fn original_exists(&self, filename: &str) -> bool {
        match self.original_path(filename) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn derived_exists(&self, kind: DerivedKind, filename: &str) -> bool {
        match self.derived_path(kind, filename) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn thumbnail_exists(&self, filename: &str) -> bool {
        self.derived_exists(DerivedKind::Thumbnail, filename).await
    }

    pub async fn preview_exists(&self, filename: &str) -> bool {
        self.derived_exists(DerivedKind::Preview, filename).await
    }

    /// Verify the root directory is present and readable.
    pub async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(StorageError::ReadFailed(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }
}

/// Originals are recognised by extension; staging files are hidden and never match.
fn is_listable(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Rename a temporary file into place. On failure the temporary path is handed back.
async fn persist(
    temp: TempPath,
    target: PathBuf,
    overwrite: bool,
) -> Result<(), (io::Error, Option<TempPath>)> {
    let joined = tokio::task::spawn_blocking(move || {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o644))
            {
                return Err((e, Some(temp)));
            }
        }

        let result = if overwrite {
            temp.persist(&target)
        } else {
            temp.persist_noclobber(&target)
        };
        result.map_err(|e| (e.error, Some(e.path)))
    })
    .await;

    match joined {
        Ok(result) => result,
        Err(e) => Err((io::Error::other(e.to_string()), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store_in(dir: &Path) -> LocalAssetStore {
        LocalAssetStore::new(dir, true).await
    }

    #[tokio::test]
    async fn test_new_creates_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("media");
        let store = store_in(&root).await;

        assert!(root.is_dir());
        assert!(store.derived_dir(DerivedKind::Thumbnail).is_dir());
        assert!(store.derived_dir(DerivedKind::Preview).is_dir());
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_new_without_derived_dirs() {
        let dir = tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path(), false).await;
        assert!(!store.derived_dir(DerivedKind::Thumbnail).exists());
        assert!(store
            .list_derived(DerivedKind::Thumbnail)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_directory_creation_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let store = LocalAssetStore::new(blocker.join("media"), true).await;
        assert!(store.list_originals().await.is_err());
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_save_and_read_original() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let mut reader: &[u8] = b"original bytes";
        let size = store.save_original(&mut reader, "a.jpg").await.unwrap();
        assert_eq!(size, 14);
        assert_eq!(store.read_original("a.jpg").await.unwrap(), b"original bytes");
    }

    #[tokio::test]
    async fn test_save_original_truncates_existing() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let mut long: &[u8] = b"a much longer payload";
        store.save_original(&mut long, "a.png").await.unwrap();
        let mut short: &[u8] = b"short";
        store.save_original(&mut short, "a.png").await.unwrap();

        assert_eq!(store.read_original("a.png").await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_list_originals_filters_entries() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        for name in ["a.jpg", "b.JPEG", "c.png", "d.gif", "e.webp", "notes.txt", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.jpg")).unwrap();

        let mut names = store.list_originals().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "b.JPEG", "c.png", "d.gif", "e.webp"]);
    }

    #[tokio::test]
    async fn test_staged_file_is_invisible_until_persisted() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let mut reader: &[u8] = b"pending";
        let mut staged = store.stage(&mut reader).await.unwrap();
        assert_eq!(staged.size(), 7);
        assert!(store.list_originals().await.unwrap().is_empty());

        store
            .persist_staged(&mut staged, "ready.jpg", false)
            .await
            .unwrap();
        assert!(staged.is_persisted());
        assert_eq!(store.list_originals().await.unwrap(), vec!["ready.jpg"]);
    }

    #[tokio::test]
    async fn test_dropped_stage_leaves_no_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let mut reader: &[u8] = b"abandoned";
        let staged = store.stage(&mut reader).await.unwrap();
        drop(staged);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_persist_without_overwrite_keeps_existing() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let mut first: &[u8] = b"first";
        store.save_original(&mut first, "same.jpg").await.unwrap();

        let mut second: &[u8] = b"second";
        let mut staged = store.stage(&mut second).await.unwrap();
        let result = store.persist_staged(&mut staged, "same.jpg", false).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert!(!staged.is_persisted());
        assert_eq!(store.read_original("same.jpg").await.unwrap(), b"first");

        store
            .persist_staged(&mut staged, "other.jpg", false)
            .await
            .unwrap();
        assert_eq!(store.read_original("other.jpg").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let result = store.delete("missing.jpg").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let mut reader: &[u8] = b"x";
        store.save_original(&mut reader, "gone.jpg").await.unwrap();
        store.delete("gone.jpg").await.unwrap();
        assert!(store.list_originals().await.unwrap().is_empty());
        assert!(!store.original_exists("gone.jpg").await);
    }

    #[tokio::test]
    async fn test_derived_assets() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        assert!(!store.thumbnail_exists("a.jpg").await);
        store
            .write_derived(DerivedKind::Thumbnail, "a.jpg", b"thumb")
            .await
            .unwrap();
        assert!(store.thumbnail_exists("a.jpg").await);
        assert!(!store.preview_exists("a.jpg").await);

        store
            .write_derived(DerivedKind::Thumbnail, "a.jpg", b"t2")
            .await
            .unwrap();
        let data = std::fs::read(store.derived_path(DerivedKind::Thumbnail, "a.jpg").unwrap())
            .unwrap();
        assert_eq!(data, b"t2");

        let thumbs = store.list_derived(DerivedKind::Thumbnail).await.unwrap();
        assert!(thumbs.contains("a.jpg"));
        assert_eq!(thumbs.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_filenames_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path()).await;

        for name in ["", "../etc/passwd", "a/b.jpg", ".hidden.jpg", "a\\b.jpg"] {
            let result = store.read_original(name).await;
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "accepted {name:?}"
            );
        }
        assert!(matches!(
            store.delete("../x.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(!store.thumbnail_exists("../x.jpg").await);
    }
}
