use std::path::Path;

pub(crate) fn load_binary(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|err| format!("Failed to read {:?}: {}", path, err))
}

/// Writes `bytes` to `path`, creating any missing parent directories.
pub(crate) fn write_binary(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}
