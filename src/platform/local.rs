use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use super::{NativeResourceManager, PlatformEnv, RawFile, ResourceBackend};

/// Platform context backed by the local filesystem
///
/// The descriptor is the directory holding the packaged assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPlatform;

impl PlatformEnv for LocalPlatform {
    type Descriptor = Path;

    fn init_resource_manager(&self, root: &Path) -> Option<NativeResourceManager> {
        if !root.is_dir() {
            warn!(root = %root.display(), "Asset root is not a directory");
            return None;
        }
        Some(NativeResourceManager::new(DirResourceManager::new(root)))
    }
}

/// Serves assets from a directory, rejecting paths that escape it
#[derive(Debug, Clone)]
pub struct DirResourceManager {
    root: PathBuf,
}

impl DirResourceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !contained {
            warn!(path, "Asset path escapes the asset root");
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ResourceBackend for DirResourceManager {
    fn open_raw_file(&self, path: &str) -> Option<Box<dyn RawFile>> {
        let full = self.resolve(path)?;
        let file = File::open(&full).ok()?;
        let size = file.metadata().ok().filter(|m| m.is_file())?.len();
        debug!(path = %full.display(), size, "Opened asset file");
        Some(Box::new(DirRawFile {
            file: Some(file),
            size,
        }))
    }
}

struct DirRawFile {
    file: Option<File>,
    size: u64,
}

impl RawFile for DirRawFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let Some(file) = self.file.as_mut() else {
            return 0;
        };

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Asset read failed");
                    break;
                }
            }
        }
        filled
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::read_asset;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_local_platform_reads_assets() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("vue2")).unwrap();
        fs::write(temp_dir.path().join("vue2/index.js"), b"console.log(1)").unwrap();

        let manager = LocalPlatform
            .init_resource_manager(temp_dir.path())
            .unwrap();

        let bytes = read_asset("/vue2/index.js", &manager, false).unwrap();
        assert_eq!(bytes, b"console.log(1)");
    }

    #[test]
    fn test_local_platform_rejects_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        assert!(LocalPlatform.init_resource_manager(&missing).is_none());
    }

    #[test]
    fn test_dir_manager_rejects_escaping_paths() {
        let temp_dir = TempDir::new().unwrap();
        let manager = DirResourceManager::new(temp_dir.path());

        assert!(manager.open_raw_file("../secret").is_none());
        assert!(manager.open_raw_file("/etc/passwd").is_none());
    }

    #[test]
    fn test_dir_manager_does_not_open_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("sub")).unwrap();
        let manager = DirResourceManager::new(temp_dir.path());

        assert!(manager.open_raw_file("sub").is_none());
    }
}
