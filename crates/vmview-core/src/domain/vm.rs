//! VM descriptors returned by the discovery query.

use std::fmt;

/// Container format of an [`EncodedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
}

impl ImageFormat {
    /// MIME type, e.g. for building a `data:` URL.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Still image kept in its compressed form.
///
/// Pixel decoding belongs to whatever surface finally displays the image.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl EncodedImage {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            format: ImageFormat::Jpeg,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Image bytes are noise in log output; show the size only.
impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Immutable snapshot of one VM as reported by a `serverInfo` reply.
///
/// Each query yields its own descriptor; nothing is shared between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmDescriptor {
    pub name: String,
    pub description: String,
    /// Endpoint the descriptor was obtained from; connect here to view it.
    pub url: String,
    pub thumbnail: EncodedImage,
}

impl VmDescriptor {
    /// Returns the description, or `None` when the server left it blank.
    pub fn description(&self) -> Option<&str> {
        if self.description.is_empty() {
            None
        } else {
            Some(&self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_description_is_none() {
        let vm = VmDescriptor {
            name: "X".to_string(),
            description: String::new(),
            url: "ws://localhost:6004".to_string(),
            thumbnail: EncodedImage::jpeg(Vec::new()),
        };
        assert_eq!(vm.description(), None);
    }

    #[test]
    fn test_encoded_image_debug_hides_bytes() {
        let image = EncodedImage::jpeg(vec![0xFF; 4096]);
        let debug = format!("{image:?}");
        assert!(debug.contains("4096"));
        assert!(!debug.contains("255"));
    }

    #[test]
    fn test_jpeg_mime_type() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Jpeg.to_string(), "jpeg");
    }
}
