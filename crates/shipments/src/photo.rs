//! Delivery photos.
//!
//! A courier attaches a photo when a delivery fails. The image is not stored
//! separately: it is turned into a `data:` URL that the client sends back as
//! the `imagen_url` of the state change.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use envios_core::{DomainError, DomainResult};

/// Largest accepted image, in bytes.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const FIELD: &str = "file";

/// A validated uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    content_type: String,
    bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(content_type: &str, bytes: Vec<u8>) -> DomainResult<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();

        let subtype = content_type.strip_prefix("image/").unwrap_or_default();
        if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) {
            return Err(DomainError::validation(FIELD, "only image uploads are accepted"));
        }
        if bytes.is_empty() {
            return Err(DomainError::validation(FIELD, "file is empty"));
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(DomainError::validation(
                FIELD,
                format!("image exceeds {} MiB", MAX_PHOTO_BYTES / (1024 * 1024)),
            ));
        }

        Ok(Self { content_type, bytes })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Inline reference usable as a history entry's photo.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, BASE64.encode(&self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 red PNG.
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn pixel() -> Vec<u8> {
        BASE64.decode(PIXEL).unwrap()
    }

    #[test]
    fn png_becomes_a_data_url() {
        let photo = PhotoUpload::new("image/PNG", pixel()).unwrap();
        assert_eq!(photo.content_type(), "image/png");
        assert_eq!(photo.data_url(), format!("data:image/png;base64,{PIXEL}"));
    }

    #[test]
    fn rejects_non_images_and_bad_sizes() {
        for ct in ["application/pdf", "image/", "image/png;x=<script>", ""] {
            let err = PhotoUpload::new(ct, pixel()).unwrap_err();
            assert_eq!(err.field(), Some("file"), "{ct}");
        }

        assert!(PhotoUpload::new("image/jpeg", Vec::new()).is_err());
        assert!(PhotoUpload::new("image/jpeg", vec![0; MAX_PHOTO_BYTES + 1]).is_err());
        assert!(PhotoUpload::new("image/jpeg", vec![0; MAX_PHOTO_BYTES]).is_ok());
    }
}
