use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Path escapes the serving directory: {0:?}")]
    OutsideRoot(String),
    #[error("File not found: {0:?}")]
    NotFound(String),
}

/// Files beneath a single root directory. Every name is resolved against the
/// canonical root and must stay inside it.
#[derive(Debug, Clone)]
pub struct ServeDir {
    root: PathBuf,
}

impl ServeDir {
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: std::fs::canonicalize(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexical check: only plain components, at least one of them.
    fn join(&self, name: &str) -> Result<PathBuf, FileError> {
        let relative = Path::new(name);
        let mut components = 0;
        for component in relative.components() {
            match component {
                Component::Normal(_) => components += 1,
                Component::CurDir => {}
                _ => return Err(FileError::OutsideRoot(name.to_string())),
            }
        }
        if components == 0 {
            return Err(FileError::NotFound(name.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Symlinks are followed, so the canonical target is checked again.
    async fn contain(&self, name: &str, path: &Path) -> Result<PathBuf, FileError> {
        let canonical = fs::canonicalize(path).await?;
        if !canonical.starts_with(&self.root) {
            return Err(FileError::OutsideRoot(name.to_string()));
        }
        Ok(canonical)
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, FileError> {
        let path = self.join(name)?;
        let path = match self.contain(name, &path).await {
            Err(FileError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FileError::NotFound(name.to_string()))
            }
            other => other?,
        };
        Ok(fs::read(path).await?)
    }

    /// Creates or truncates `name`. The parent directory must already exist
    /// inside the root.
    pub async fn write(&self, name: &str, contents: &[u8]) -> Result<(), FileError> {
        let path = self.join(name)?;
        let parent = path.parent().unwrap_or(&self.root);
        self.contain(name, parent).await?;

        if let Ok(existing) = fs::symlink_metadata(&path).await {
            if existing.file_type().is_symlink() {
                self.contain(name, &path).await?;
            }
        }

        fs::write(&path, contents).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    /// A fresh, empty directory under the system temp dir.
    pub(crate) fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rhs-{label}-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = ServeDir::new(temp_dir("files")).unwrap();
        dir.write("foo.txt", b"hello").await.unwrap();
        assert_eq!(dir.read("foo.txt").await.unwrap(), b"hello");

        dir.write("foo.txt", b"bye").await.unwrap();
        assert_eq!(dir.read("foo.txt").await.unwrap(), b"bye");
    }

    #[tokio::test]
    async fn test_read_missing() {
        let dir = ServeDir::new(temp_dir("files")).unwrap();
        assert!(matches!(
            dir.read("missing.txt").await,
            Err(FileError::NotFound(s)) if s == "missing.txt"
        ));
        assert!(matches!(dir.read("").await, Err(FileError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_directory_fails() {
        let root = temp_dir("files");
        std::fs::create_dir(root.join("sub")).unwrap();
        let dir = ServeDir::new(&root).unwrap();
        assert!(dir.read("sub").await.is_err());
    }

    #[tokio::test]
    async fn test_nested_paths() {
        let root = temp_dir("files");
        std::fs::create_dir(root.join("sub")).unwrap();
        let dir = ServeDir::new(&root).unwrap();

        dir.write("sub/a.bin", &[1, 2, 3]).await.unwrap();
        assert_eq!(dir.read("sub/./a.bin").await.unwrap(), vec![1, 2, 3]);
        assert!(dir.write("nosuchdir/a.bin", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let outer = temp_dir("files");
        std::fs::write(outer.join("secret.txt"), b"secret").unwrap();
        std::fs::create_dir(outer.join("root")).unwrap();
        let dir = ServeDir::new(outer.join("root")).unwrap();

        assert!(matches!(
            dir.read("../secret.txt").await,
            Err(FileError::OutsideRoot(_))
        ));
        assert!(matches!(
            dir.read("/etc/passwd").await,
            Err(FileError::OutsideRoot(_))
        ));
        assert!(matches!(
            dir.write("../evil.txt", b"x").await,
            Err(FileError::OutsideRoot(_))
        ));
        assert!(!outer.join("evil.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_rejected() {
        let outer = temp_dir("files");
        std::fs::write(outer.join("secret.txt"), b"secret").unwrap();
        std::fs::create_dir(outer.join("root")).unwrap();
        std::os::unix::fs::symlink(outer.join("secret.txt"), outer.join("root/link")).unwrap();
        let dir = ServeDir::new(outer.join("root")).unwrap();

        assert!(matches!(dir.read("link").await, Err(FileError::OutsideRoot(_))));
        assert!(matches!(
            dir.write("link", b"x").await,
            Err(FileError::OutsideRoot(_))
        ));
        assert_eq!(std::fs::read(outer.join("secret.txt")).unwrap(), b"secret");
    }
}
