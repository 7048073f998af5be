use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed UTF-16 text in {0:?}")]
    InvalidUtf16(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// Not valid UTF-8; invalid sequences were replaced
    Utf8Lossy,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf8Bom => "UTF-8 (BOM)",
            TextEncoding::Utf16Le => "UTF-16LE",
            TextEncoding::Utf16Be => "UTF-16BE",
            TextEncoding::Utf8Lossy => "UTF-8 (lossy)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedText {
    pub content: String,
    pub encoding: TextEncoding,
}

/// Where book content comes from
pub trait BookSource {
    fn read(&self, path: &Path) -> Result<LoadedText, ImportError>;
}

/// Reads books straight from the file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl BookSource for FsSource {
    fn read(&self, path: &Path) -> Result<LoadedText, ImportError> {
        let bytes = fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode(bytes).ok_or_else(|| ImportError::InvalidUtf16(path.to_path_buf()))
    }
}

/// Decode by byte-order mark, falling back to (lossy) UTF-8
pub fn decode(bytes: Vec<u8>) -> Option<LoadedText> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return Some(LoadedText {
            content: String::from_utf8_lossy(rest).into_owned(),
            encoding: TextEncoding::Utf8Bom,
        });
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units = rest.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
        return decode_utf16(units, TextEncoding::Utf16Le);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = rest.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
        return decode_utf16(units, TextEncoding::Utf16Be);
    }
    match String::from_utf8(bytes) {
        Ok(content) => Some(LoadedText {
            content,
            encoding: TextEncoding::Utf8,
        }),
        Err(e) => Some(LoadedText {
            content: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            encoding: TextEncoding::Utf8Lossy,
        }),
    }
}

fn decode_utf16(units: impl Iterator<Item = u16>, encoding: TextEncoding) -> Option<LoadedText> {
    let content = char::decode_utf16(units).collect::<Result<String, _>>().ok()?;
    Some(LoadedText { content, encoding })
}

/// Only `.txt` files are accepted by drag and drop
pub fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// File name shown on the shelf
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_decode_variants() {
        let plain = decode("第一章".as_bytes().to_vec()).unwrap();
        assert_eq!(plain.encoding, TextEncoding::Utf8);
        assert_eq!(plain.content, "第一章");

        let mut bom = vec![0xEF, 0xBB, 0xBF];
        bom.extend_from_slice(b"hi");
        let bom = decode(bom).unwrap();
        assert_eq!(bom.encoding, TextEncoding::Utf8Bom);
        assert_eq!(bom.content, "hi");

        let mut le = vec![0xFF, 0xFE];
        for unit in "书".encode_utf16() {
            le.extend_from_slice(&unit.to_le_bytes());
        }
        let le = decode(le).unwrap();
        assert_eq!(le.encoding, TextEncoding::Utf16Le);
        assert_eq!(le.content, "书");

        let mut be = vec![0xFE, 0xFF];
        for unit in "ab".encode_utf16() {
            be.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode(be).unwrap().content, "ab");

        let lossy = decode(vec![b'a', 0xC3, b'b']).unwrap();
        assert_eq!(lossy.encoding, TextEncoding::Utf8Lossy);
        assert!(lossy.content.starts_with('a'));
    }

    #[test]
    fn test_unpaired_surrogate_is_rejected() {
        let bytes = vec![0xFF, 0xFE, 0x00, 0xD8];
        assert!(decode(bytes).is_none());
    }

    #[test]
    fn test_fs_source_reads_and_fails() {
        let test_dir = std::env::temp_dir().join(format!("test_import_{}", Uuid::new_v4()));
        fs::create_dir_all(&test_dir).unwrap();
        let path = test_dir.join("book.txt");
        fs::write(&path, "Title\n\nBody").unwrap();

        let loaded = FsSource.read(&path).unwrap();
        assert_eq!(loaded.content, "Title\n\nBody");

        let missing = FsSource.read(&test_dir.join("missing.txt"));
        assert!(matches!(missing, Err(ImportError::Io { .. })));

        let _ = fs::remove_dir_all(&test_dir);
    }

    #[test]
    fn test_supported_files() {
        assert!(is_supported_file(Path::new("/novels/book.txt")));
        assert!(is_supported_file(Path::new("BOOK.TXT")));
        assert!(!is_supported_file(Path::new("book.epub")));
        assert!(!is_supported_file(Path::new("txt")));
        assert_eq!(display_name(Path::new("/novels/三体.txt")), "三体.txt");
    }
}
