use std::{fs, path::Path};

use eyre::{eyre, Result};

/// Write contents to a file on disk, creating parent directories as needed.
///
/// ```no_run
/// use ledgervm_common::utils::io::file::write_file;
///
/// write_file("/tmp/ledgervm/report.json", "{}").expect("failed to write");
/// ```
pub fn write_file(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| eyre!("unable to create directory {}: {e}", parent.display()))?;
    }

    fs::write(path, contents).map_err(|e| eyre!("unable to write {}: {e}", path.display()))
}

/// Read the contents of a file on disk.
pub fn read_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| eyre!("unable to read {}: {e}", path.display()))
}

/// Delete a file or directory from disk. Missing paths are not an error.
pub fn delete_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let result = if path.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(eyre!("unable to delete {}: {e}", path.display())),
    }
}
