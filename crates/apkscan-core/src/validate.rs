//! Cheap local checks run before any artifact is uploaded.

use std::fs::File;
use std::path::Path;

use zip::ZipArchive;

use crate::error::ValidationError;

pub const MANIFEST_ENTRY: &str = "AndroidManifest.xml";
pub const APK_EXTENSION: &str = "apk";

/// True if `path` is a readable zip archive with an `AndroidManifest.xml`
/// entry at its root. Any error reads as "not valid".
pub fn is_valid_apk(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let Ok(archive) = ZipArchive::new(file) else {
        return false;
    };
    let found = archive.file_names().any(|name| name == MANIFEST_ENTRY);
    found
}

pub fn has_apk_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == APK_EXTENSION)
}

/// Run every pre-upload check in order, reporting the first one that fails.
pub fn check_artifact(path: &Path) -> Result<(), ValidationError> {
    if !path.is_file() {
        return Err(ValidationError::NotAFile);
    }
    if !has_apk_extension(path) {
        return Err(ValidationError::WrongExtension);
    }
    if !is_valid_apk(path) {
        return Err(ValidationError::InvalidArchive);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Write a zip at `dir/name` containing the given entries.
    pub fn write_zip(dir: &Path, name: &str, entries: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for entry in entries {
            zip.start_file(*entry, options).unwrap();
            zip.write_all(b"<manifest/>").unwrap();
        }
        zip.finish().unwrap();
        path
    }

    pub fn write_apk(dir: &Path, name: &str) -> PathBuf {
        write_zip(dir, name, &["AndroidManifest.xml", "classes.dex"])
    }
}
