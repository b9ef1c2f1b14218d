// src/models/upload.rs
// DOCUMENTATION: Incoming file parts
// PURPOSE: Transport-neutral representation of one uploaded file

use std::path::Path;
use tokio::io::AsyncRead;

/// One file part of a multipart request
/// DOCUMENTATION: `declared_size` is what the client claimed; the reader may
/// yield more or fewer bytes, and the writer never stores more than the cap
pub struct UploadPart {
    pub original_name: String,
    pub declared_size: u64,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl UploadPart {
    pub fn new(
        original_name: impl Into<String>,
        declared_size: u64,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            declared_size,
            reader: Box::new(reader),
        }
    }

    /// Build a part from bytes already held in memory
    pub fn from_bytes(original_name: impl Into<String>, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self::new(original_name, size, std::io::Cursor::new(data))
    }

    /// Lower-cased extension including the dot, or an empty string
    pub fn extension(&self) -> String {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for UploadPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPart")
            .field("original_name", &self.original_name)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(UploadPart::from_bytes("Foto.JPG", vec![]).extension(), ".jpg");
        assert_eq!(UploadPart::from_bytes("a.b.png", vec![]).extension(), ".png");
    }

    #[test]
    fn test_extension_missing() {
        assert_eq!(UploadPart::from_bytes("README", vec![]).extension(), "");
        assert_eq!(UploadPart::from_bytes(".hidden", vec![]).extension(), "");
    }

    #[test]
    fn test_from_bytes_declares_length() {
        let part = UploadPart::from_bytes("x.gif", vec![0u8; 12]);
        assert_eq!(part.declared_size, 12);
    }
}
