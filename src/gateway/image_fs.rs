use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding one file per stored image, named after the image row.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of `name` inside the store. Only the final path component is used.
    pub fn path_of(&self, name: &str) -> PathBuf {
        let file_name = Path::new(name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.root.join(file_name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Write `bytes` under `name`, replacing any previous file.
    pub fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_of(name);
        fs::create_dir_all(&self.root)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Write `bytes` under `name` unless a file is already there.
    /// Returns whether anything was written.
    pub fn write_if_missing(&self, name: &str, bytes: &[u8]) -> io::Result<bool> {
        if self.exists(name) {
            return Ok(false);
        }
        self.write(name, bytes)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("images"));

        assert!(!store.exists("a.jpg"));
        assert!(store.write_if_missing("a.jpg", b"one").unwrap());
        assert!(!store.write_if_missing("a.jpg", b"two").unwrap());
        assert_eq!(fs::read(store.path_of("a.jpg")).unwrap(), b"one");
    }

    #[test]
    fn path_of_strips_directories() {
        let store = ImageStore::new("/srv/images");
        assert_eq!(store.path_of("../../etc/passwd"), PathBuf::from("/srv/images/passwd"));
    }
}
