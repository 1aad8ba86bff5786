use tracing::{debug, error};

use super::NativeResourceManager;

/// Blocking read of one packaged asset
///
/// One leading `/` is stripped since packaged roots are relative. A missing
/// asset or a short read yields `None`; partial content is never returned.
/// With `auto_fill` the buffer gets one extra trailing `0` byte so it can be
/// used as a C-style text buffer.
pub fn read_asset(path: &str, manager: &NativeResourceManager, auto_fill: bool) -> Option<Vec<u8>> {
    let asset_path = path.strip_prefix('/').unwrap_or(path);
    debug!(asset_path, "Reading asset");

    let Some(mut asset) = manager.open(asset_path) else {
        debug!(asset_path, "Asset not found");
        return None;
    };

    let file_size = asset.size();
    let Ok(size) = usize::try_from(file_size) else {
        error!(path, file_size, "Asset too large for this platform");
        return None;
    };
    let capacity = if auto_fill { size.checked_add(1)? } else { size };

    let mut bytes: Vec<u8> = Vec::new();
    if let Err(e) = bytes.try_reserve_exact(capacity) {
        error!(path, file_size, error = %e, "Cannot allocate asset buffer");
        return None;
    }
    bytes.resize(capacity, 0);
    let read_bytes = asset.read(&mut bytes[..size]);
    if read_bytes != size {
        error!(path, file_size, read_bytes, "Short read on asset");
        return None;
    }

    if auto_fill {
        bytes[size] = 0;
    }

    debug!(path, len = bytes.len(), "Asset read");
    Some(bytes)
}
