use bytes::Bytes;
use std::collections::HashMap;

use super::{RawFile, ResourceBackend};

/// In-memory asset store for testing/development
#[derive(Debug, Clone, Default)]
pub struct InMemoryResourceManager {
    assets: HashMap<String, Bytes>,
}

impl InMemoryResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Bytes>) {
        self.assets.insert(path.into(), content.into());
    }

    pub fn with_asset(mut self, path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.insert(path, content);
        self
    }
}

impl ResourceBackend for InMemoryResourceManager {
    fn open_raw_file(&self, path: &str) -> Option<Box<dyn RawFile>> {
        self.assets
            .get(path)
            .cloned()
            .map(|content| Box::new(MemoryFile { content }) as Box<dyn RawFile>)
    }
}

struct MemoryFile {
    content: Bytes,
}

impl RawFile for MemoryFile {
    fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.content.len());
        buf[..n].copy_from_slice(&self.content[..n]);
        n
    }

    fn close(&mut self) {
        self.content = Bytes::new();
    }
}
