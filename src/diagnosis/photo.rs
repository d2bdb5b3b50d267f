//! Plant photo loading and pre-flight validation.
//!
//! Size and MIME checks happen here, before any network use. A rejected
//! photo never reaches the gateway.

use base64::Engine;
use std::path::Path;
use thiserror::Error;

/// Upload limit enforced client-side.
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

const ALLOWED_MIME_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Ukuran file maksimal adalah 5MB")]
    TooLarge,
    #[error("Format file harus PNG atau JPEG")]
    UnsupportedType,
    #[error("Gagal membaca file gambar.")]
    Unreadable(#[source] std::io::Error),
}

/// An uploaded plant photo, held only in controller state. Replaced or
/// cleared on re-upload, edit, or reset; never persisted locally.
#[derive(Debug, Clone)]
pub struct PlantPhoto {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PlantPhoto {
    /// Load and validate a photo from disk. Rejects files over 5 MiB and
    /// MIME types other than png/jpeg before reading is wasted on them.
    pub fn from_path(path: &Path) -> Result<Self, PhotoError> {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let mime_type = mime.essence_str().to_string();
        if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(PhotoError::UnsupportedType);
        }

        let metadata = std::fs::metadata(path).map_err(PhotoError::Unreadable)?;
        if metadata.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge);
        }

        let bytes = std::fs::read(path).map_err(PhotoError::Unreadable)?;
        if bytes.len() as u64 > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge);
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// `data:` URI used wherever the original showed an inline preview.
    pub fn display_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_photo(dir: &Path, name: &str, len: usize) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![0xAB; len]).unwrap();
        path
    }

    #[test]
    fn accepts_a_small_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_photo(dir.path(), "daun.jpg", 2 * 1024 * 1024);

        let photo = PlantPhoto::from_path(&path).unwrap();
        assert_eq!(photo.file_name, "daun.jpg");
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(photo.bytes.len(), 2 * 1024 * 1024);
    }

    #[test]
    fn accepts_png_and_jpeg_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.jpeg", "c.jpg"] {
            let path = write_photo(dir.path(), name, 16);
            assert!(PlantPhoto::from_path(&path).is_ok(), "{} rejected", name);
        }
    }

    #[test]
    fn rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_photo(dir.path(), "besar.jpg", (MAX_PHOTO_BYTES + 1) as usize);

        assert!(matches!(
            PlantPhoto::from_path(&path),
            Err(PhotoError::TooLarge)
        ));
    }

    #[test]
    fn exactly_at_the_limit_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_photo(dir.path(), "pas.png", MAX_PHOTO_BYTES as usize);
        assert!(PlantPhoto::from_path(&path).is_ok());
    }

    #[test]
    fn rejects_unsupported_types() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["doc.pdf", "anim.gif", "noext"] {
            let path = write_photo(dir.path(), name, 16);
            assert!(
                matches!(PlantPhoto::from_path(&path), Err(PhotoError::UnsupportedType)),
                "{} accepted",
                name
            );
        }
    }

    #[test]
    fn data_uri_carries_the_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_photo(dir.path(), "kecil.png", 4);

        let photo = PlantPhoto::from_path(&path).unwrap();
        assert!(photo.display_data_uri().starts_with("data:image/png;base64,"));
    }
}
