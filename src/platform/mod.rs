//! Platform resource manager used by the asset handler
//!
//! The packaged-asset store is reached through [`ResourceBackend`]. A backend
//! is assumed safe for concurrent read-only use: several in-flight reads may
//! open files through one manager at the same time, which is why the trait
//! requires `Send + Sync` and takes `&self` everywhere.
//!
//! Native handles are scope-bound: [`RawFileGuard`] closes an opened file on
//! every exit path and [`NativeResourceManager`] releases its backend exactly
//! once, when the last owner drops it.

mod local;
mod memory;
pub mod reader;

pub use local::{DirResourceManager, LocalPlatform};
pub use memory::InMemoryResourceManager;
pub use reader::read_asset;

use std::fmt;
use tracing::debug;

/// An opened packaged asset
pub trait RawFile: Send {
    /// Declared size in bytes
    fn size(&self) -> u64;

    /// Fill `buf` from the start of the asset, returning the bytes read
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Release the native handle. Called exactly once per opened file.
    fn close(&mut self);
}

/// Platform asset store
pub trait ResourceBackend: Send + Sync {
    /// Open a relative asset path; `None` when it does not exist
    fn open_raw_file(&self, path: &str) -> Option<Box<dyn RawFile>>;

    /// Release the native manager. Called exactly once.
    fn release(&self) {}
}

/// Creates resource managers from a platform context
///
/// Implementations may require being called on the thread that owns the
/// platform/UI context.
pub trait PlatformEnv {
    type Descriptor: ?Sized;

    fn init_resource_manager(&self, descriptor: &Self::Descriptor) -> Option<NativeResourceManager>;
}

/// Single owner of a platform resource backend
pub struct NativeResourceManager {
    backend: Box<dyn ResourceBackend>,
}

impl NativeResourceManager {
    pub fn new(backend: impl ResourceBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Open an asset; the returned guard closes it when dropped
    pub fn open(&self, path: &str) -> Option<RawFileGuard> {
        self.backend
            .open_raw_file(path)
            .map(|file| RawFileGuard { file })
    }
}

impl Drop for NativeResourceManager {
    fn drop(&mut self) {
        self.backend.release();
        debug!("Native resource manager released");
    }
}

impl fmt::Debug for NativeResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeResourceManager").finish_non_exhaustive()
    }
}

/// Opened asset that is closed when the guard goes out of scope
pub struct RawFileGuard {
    file: Box<dyn RawFile>,
}

impl RawFileGuard {
    pub fn size(&self) -> u64 {
        self.file.size()
    }

    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.file.read(buf)
    }
}

impl Drop for RawFileGuard {
    fn drop(&mut self) {
        self.file.close();
    }
}
