use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

/// Smallest possible zip: a bare end-of-central-directory record.
pub const MIN_ARCHIVE_SIZE: u64 = 22;

const LOCAL_FILE_HEADER: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

/// Destinations ending in `.jar` or `.zip` are validated as archives.
pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Structural zip check. Fails closed: any problem yields `false`.
///
/// A file passes when it exists, is at least [`MIN_ARCHIVE_SIZE`] bytes,
/// starts with a local file header and its central directory parses.
pub fn is_valid_archive(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() || meta.len() < MIN_ARCHIVE_SIZE {
        return false;
    }

    let Ok(mut file) = File::open(path) else {
        return false;
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() {
        return false;
    }
    if magic != LOCAL_FILE_HEADER {
        debug!("Invalid zip header for {:?}: {}", path, hex::encode(magic));
        return false;
    }

    if file.seek(SeekFrom::Start(0)).is_err() {
        return false;
    }

    match zip::ZipArchive::new(file) {
        Ok(_) => true,
        Err(e) => {
            debug!("Zip central directory unreadable for {:?}: {}", path, e);
            false
        }
    }
}

/// [`is_valid_archive`] off the async executor.
pub async fn validate_archive(path: &Path) -> bool {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || is_valid_archive(&path))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::zip_bytes;

    #[test]
    fn missing_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_valid_archive(&dir.path().join("nope.jar")));
    }

    #[test]
    fn tiny_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.jar");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        assert!(!is_valid_archive(&path));
    }

    #[test]
    fn wrong_signature_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jar");
        std::fs::write(&path, vec![0xAB; 512]).unwrap();
        assert!(!is_valid_archive(&path));
    }

    #[test]
    fn truncated_central_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.jar");
        let mut bytes = zip_bytes(&[("a.class", b"0123456789abcdef")]);
        bytes.truncate(bytes.len() - 10);
        std::fs::write(&path, bytes).unwrap();
        assert!(!is_valid_archive(&path));
    }

    #[test]
    fn well_formed_zip_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.jar");
        std::fs::write(&path, zip_bytes(&[("a.class", b"cafebabe")])).unwrap();
        assert!(is_valid_archive(&path));
    }

    #[test]
    fn archive_type_is_decided_by_extension() {
        assert!(is_archive_path(Path::new("libs/a-1.0.jar")));
        assert!(is_archive_path(Path::new("pack.ZIP")));
        assert!(!is_archive_path(Path::new("assets/objects/ab/abcdef")));
        assert!(!is_archive_path(Path::new("indexes/17.json")));
    }
}
