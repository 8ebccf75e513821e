//! Archive creation and extraction for backups.
//!
//! Directories are packed into an uncompressed tar with entry paths relative
//! to the source root. Single files are passed through untouched so that a
//! direct backup of one file round-trips byte for byte.

use std::io::Cursor;
use std::path::Path;

use obscure_core::{Error, Result};
use tar::{Builder as TarBuilder, EntryType};
use walkdir::WalkDir;

/// Offset and magic of the ustar header field, used to sniff tar payloads.
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8] = b"ustar";

/// Output of the archive step.
#[derive(Debug, Clone)]
pub struct ArchiveOutput {
    /// Raw payload handed to the rest of the pipeline
    pub data: Vec<u8>,
    /// True when the payload is a tar of a directory
    pub was_directory: bool,
    /// Number of file entries in the payload
    pub file_count: usize,
}

/// Build the upload payload for a source path.
///
/// Directories become a tar archive; a single file is read as-is. Entry
/// paths inside the tar are relative to `source`, so extraction recreates
/// the directory's contents under the chosen destination.
pub fn create_archive(source: &Path) -> Result<ArchiveOutput> {
    let metadata = std::fs::metadata(source).map_err(|e| {
        Error::archive(format!("cannot read source {}: {}", source.display(), e))
    })?;

    if metadata.is_file() {
        let data = std::fs::read(source)?;
        return Ok(ArchiveOutput {
            data,
            was_directory: false,
            file_count: 1,
        });
    }

    if !metadata.is_dir() {
        return Err(Error::archive(format!(
            "source {} is neither a file nor a directory",
            source.display()
        )));
    }

    let mut tar = TarBuilder::new(Vec::new());
    tar.follow_symlinks(false);

    let mut file_count = 0usize;
    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::archive(format!("walk failed: {}", e)))?;
        let rel_path = match entry.path().strip_prefix(source) {
            Ok(p) if !p.as_os_str().is_empty() => p,
            _ => continue,
        };

        if entry.file_type().is_dir() {
            tar.append_dir(rel_path, entry.path())?;
        } else if entry.file_type().is_file() || entry.path_is_symlink() {
            // follow_symlinks(false) above makes this record the link itself
            tar.append_path_with_name(entry.path(), rel_path)?;
            file_count += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping special file");
        }
    }

    let data = tar
        .into_inner()
        .map_err(|e| Error::archive(format!("failed to finish tar: {}", e)))?;

    Ok(ArchiveOutput {
        data,
        was_directory: true,
        file_count,
    })
}

/// Whether a payload looks like a tar archive.
///
/// Distinguishes a direct backup of a directory (tar) from a direct backup
/// of a single file (raw bytes) at restore time.
pub fn looks_like_tar(data: &[u8]) -> bool {
    data.len() > TAR_MAGIC_OFFSET + TAR_MAGIC.len()
        && &data[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
}

/// Extract a tar payload under `dest`, returning the number of entries
/// written.
///
/// Entries are unpacked with `unpack_in`, which rejects paths escaping the
/// destination. Entry types other than directories, regular files, and
/// symlinks are refused rather than silently skipped.
pub fn extract_archive(data: &[u8], dest: &Path) -> Result<usize> {
    std::fs::create_dir_all(dest)?;

    let mut archive = tar::Archive::new(Cursor::new(data));
    let mut count = 0usize;

    for entry in archive.entries()? {
        let mut entry = entry?;
        match entry.header().entry_type() {
            EntryType::Directory | EntryType::Regular | EntryType::Symlink => {}
            other => {
                return Err(Error::archive(format!(
                    "unsupported entry type {:?} in archive",
                    other
                )));
            }
        }

        if !entry.unpack_in(dest)? {
            return Err(Error::archive(format!(
                "refusing to unpack entry outside destination: {}",
                entry.path()?.display()
            )));
        }
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        fs::create_dir_all(base.join("nested/deeper")).unwrap();
        fs::write(base.join("top.txt"), "top level").unwrap();
        fs::write(base.join("nested/inner.txt"), "inner file").unwrap();
        fs::write(base.join("nested/deeper/leaf.bin"), [0u8, 1, 2, 3]).unwrap();

        temp_dir
    }

    #[test]
    fn test_directory_archive_round_trip() {
        let source = create_test_directory();

        let output = create_archive(source.path()).unwrap();
        assert!(output.was_directory);
        assert_eq!(output.file_count, 3);
        assert!(looks_like_tar(&output.data));

        let dest = TempDir::new().unwrap();
        let extracted = extract_archive(&output.data, dest.path()).unwrap();
        assert!(extracted >= 3);

        assert_eq!(
            fs::read_to_string(dest.path().join("top.txt")).unwrap(),
            "top level"
        );
        assert_eq!(
            fs::read(dest.path().join("nested/deeper/leaf.bin")).unwrap(),
            vec![0u8, 1, 2, 3]
        );
    }

    #[test]
    fn test_single_file_is_passed_through() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        fs::write(&file, "just some notes").unwrap();

        let output = create_archive(&file).unwrap();
        assert!(!output.was_directory);
        assert_eq!(output.file_count, 1);
        assert_eq!(output.data, b"just some notes");
        assert!(!looks_like_tar(&output.data));
    }

    #[test]
    fn test_missing_source_is_archive_error() {
        let dir = TempDir::new().unwrap();
        let err = create_archive(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, obscure_core::Error::Archive { .. }));
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let dest = TempDir::new().unwrap();
        assert!(extract_archive(b"definitely not a tar stream", dest.path()).is_err());
    }

    #[test]
    fn test_empty_directory_produces_valid_tar() {
        let source = TempDir::new().unwrap();
        let output = create_archive(source.path()).unwrap();
        assert!(output.was_directory);
        assert_eq!(output.file_count, 0);

        let dest = TempDir::new().unwrap();
        extract_archive(&output.data, dest.path()).unwrap();
    }
}
