//! Source-file access.
//!
//! [`SourceFiles`] is the seam to wherever the project's files live: an
//! in-memory map for tests and replay, or a directory on disk. Paths are
//! always relative to the project root and use `/` separators.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;

use crate::error::{SourceError, SourceResult};

/// File extensions that may carry JSX nodes.
pub const SOURCE_EXTENSIONS: &[&str] = &["jsx", "tsx", "js", "ts"];

/// Directories never scanned for source nodes.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", ".next", "dist", "build", "target"];

/// Core source-file operations.
#[async_trait]
pub trait SourceFiles: Send + Sync {
    /// Read a file. `None` when it does not exist.
    async fn get_file_content(&self, path: &str) -> SourceResult<Option<String>>;

    /// Write a file, creating it if needed. `false` when the backend refused.
    async fn write_file_content(&self, path: &str, content: &str) -> SourceResult<bool>;

    /// Every file that may carry JSX nodes.
    async fn list_source_files(&self) -> SourceResult<Vec<String>>;

    /// Read a file that must exist.
    async fn read_required(&self, path: &str) -> SourceResult<String> {
        self.get_file_content(path)
            .await?
            .ok_or_else(|| SourceError::not_found(path))
    }
}

fn is_source_file(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| SOURCE_EXTENSIONS.contains(&ext))
}

// ============================================================================
// Memory backend
// ============================================================================

/// In-memory files. Thread-safe via internal `RwLock`.
#[derive(Debug, Default)]
pub struct MemorySourceFiles {
    files: RwLock<BTreeMap<String, String>>,
    refuse_writes: AtomicUsize,
}

impl MemorySourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with `(path, content)` pairs.
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let this = Self::new();
        {
            let mut map = this.files.write();
            for (path, content) in files {
                map.insert(path.into(), content.into());
            }
        }
        this
    }

    /// Synchronous read for assertions.
    pub fn content(&self, path: &str) -> Option<String> {
        self.files.read().get(path).cloned()
    }

    /// Refuse the next `n` writes.
    pub fn refuse_next_writes(&self, n: usize) {
        self.refuse_writes.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceFiles for MemorySourceFiles {
    async fn get_file_content(&self, path: &str) -> SourceResult<Option<String>> {
        Ok(self.files.read().get(path).cloned())
    }

    async fn write_file_content(&self, path: &str, content: &str) -> SourceResult<bool> {
        let refused = self
            .refuse_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Ok(false);
        }
        self.files.write().insert(path.to_string(), content.to_string());
        Ok(true)
    }

    async fn list_source_files(&self) -> SourceResult<Vec<String>> {
        Ok(self
            .files
            .read()
            .keys()
            .filter(|p| is_source_file(p))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Local backend
// ============================================================================

/// Files under a project root on disk.
///
/// Path security is enforced: relative paths with `..` or absolute paths
/// are rejected rather than resolved.
#[derive(Debug, Clone)]
pub struct LocalSourceFiles {
    root: PathBuf,
}

impl LocalSourceFiles {
    /// The root is canonicalized at construction time to handle symlinks.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> SourceResult<PathBuf> {
        let rel = Path::new(path.trim_start_matches('/'));
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SourceError::PathEscapesRoot(path.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn relative(&self, full: &Path) -> Option<String> {
        let rel = full.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl SourceFiles for LocalSourceFiles {
    async fn get_file_content(&self, path: &str) -> SourceResult<Option<String>> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SourceError::io(path, e)),
        }
    }

    async fn write_file_content(&self, path: &str, content: &str) -> SourceResult<bool> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SourceError::io(path, e))?;
        }
        fs::write(&full, content)
            .await
            .map_err(|e| SourceError::io(path, e))?;
        Ok(true)
    }

    async fn list_source_files(&self) -> SourceResult<Vec<String>> {
        let mut out = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let display = dir.display().to_string();
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| SourceError::io(&display, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| SourceError::io(&display, e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| SourceError::io(&display, e))?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if file_type.is_dir() {
                    if !SKIP_DIRS.contains(&name.as_ref()) {
                        pending.push(entry.path());
                    }
                } else if file_type.is_file() && is_source_file(&name) {
                    if let Some(rel) = self.relative(&entry.path()) {
                        out.push(rel);
                    }
                }
            }
        }
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (LocalSourceFiles, TempDir) {
        let dir = TempDir::new().unwrap();
        let files = LocalSourceFiles::new(dir.path());
        (files, dir)
    }

    #[tokio::test]
    async fn test_memory_read_write() {
        let files = MemorySourceFiles::with_files([("app/page.tsx", "a")]);
        assert_eq!(files.get_file_content("app/page.tsx").await.unwrap().as_deref(), Some("a"));
        assert!(files.get_file_content("missing.tsx").await.unwrap().is_none());
        assert!(files.write_file_content("app/page.tsx", "b").await.unwrap());
        assert_eq!(files.content("app/page.tsx").as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_memory_refused_writes() {
        let files = MemorySourceFiles::new();
        files.refuse_next_writes(1);
        assert!(!files.write_file_content("a.tsx", "x").await.unwrap());
        assert!(files.write_file_content("a.tsx", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_lists_only_sources() {
        let files = MemorySourceFiles::with_files([("a.tsx", ""), ("b.css", ""), ("c/d.jsx", "")]);
        assert_eq!(files.list_source_files().await.unwrap(), vec!["a.tsx", "c/d.jsx"]);
    }

    #[tokio::test]
    async fn test_local_round_trip_and_listing() {
        let (files, _dir) = setup().await;
        assert!(files.write_file_content("app/page.tsx", "x").await.unwrap());
        assert!(files.write_file_content("node_modules/lib/index.js", "y").await.unwrap());
        assert!(files.write_file_content("README.md", "z").await.unwrap());

        assert_eq!(files.read_required("app/page.tsx").await.unwrap(), "x");
        assert_eq!(files.list_source_files().await.unwrap(), vec!["app/page.tsx"]);
    }

    #[tokio::test]
    async fn test_local_rejects_escape() {
        let (files, _dir) = setup().await;
        let err = files.get_file_content("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, SourceError::PathEscapesRoot(_)));
        let err = files.read_required("nope.tsx").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
