//! Frame decoding.
//!
//! An image frame from the server is a complete JPEG of the VM screen.  The
//! decoder validates it and reads the frame dimensions from the SOFn header;
//! the compressed bytes are handed on untouched, and turning them into pixels
//! is left to the frame sink.
//!
//! # JPEG layout
//!
//! ```text
//! FF D8                      SOI
//! FF En  len:u16 ...         APPn (skipped)
//! FF C0  len:u16 P:u8 Y:u16 X:u16 ...   SOF0 (height Y, width X)
//! ...
//! FF DA                      SOS, entropy-coded data follows
//! ```

use thiserror::Error;
use vmview_core::EncodedImage;

/// Errors produced while validating an image frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("image frame is empty")]
    Empty,

    #[error("image frame is not a JPEG (missing SOI marker)")]
    NotJpeg,

    #[error("JPEG truncated at offset {0}")]
    Truncated(usize),

    #[error("expected a JPEG marker at offset {0}")]
    BadMarker(usize),

    #[error("JPEG has no frame header before scan data")]
    MissingFrameHeader,

    #[error("JPEG frame has zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },
}

/// A decoded screen update: dimensions plus the still-compressed image.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub image: EncodedImage,
}

/// Turns raw image-frame bytes into a [`Bitmap`].
pub trait FrameDecoder: Send {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError>;
}

/// Default decoder for the JPEG frames the server streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegFrameDecoder;

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const TEM: u8 = 0x01;

impl FrameDecoder for JpegFrameDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if bytes.len() < 2 || bytes[0] != MARKER_PREFIX || bytes[1] != SOI {
            return Err(DecodeError::NotJpeg);
        }

        let (width, height) = frame_dimensions(bytes)?;
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimension { width, height });
        }

        Ok(Bitmap {
            width,
            height,
            image: EncodedImage::jpeg(bytes.to_vec()),
        })
    }
}

/// Walks the marker segments after SOI until the first SOFn.
fn frame_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
    let mut pos = 2;

    loop {
        if pos >= bytes.len() {
            return Err(DecodeError::Truncated(pos));
        }
        if bytes[pos] != MARKER_PREFIX {
            return Err(DecodeError::BadMarker(pos));
        }
        // Any number of 0xFF fill bytes may precede a marker.
        while pos < bytes.len() && bytes[pos] == MARKER_PREFIX {
            pos += 1;
        }
        let marker = *bytes.get(pos).ok_or(DecodeError::Truncated(pos))?;
        pos += 1;

        match marker {
            TEM | 0xD0..=0xD7 => continue,
            SOS | EOI => return Err(DecodeError::MissingFrameHeader),
            _ => {}
        }

        let length = read_u16(bytes, pos)? as usize;
        if length < 2 {
            return Err(DecodeError::BadMarker(pos));
        }

        if is_start_of_frame(marker) {
            // length:u16, precision:u8, height:u16, width:u16
            let height = read_u16(bytes, pos + 3)?;
            let width = read_u16(bytes, pos + 5)?;
            return Ok((u32::from(width), u32::from(height)));
        }

        pos += length;
    }
}

// SOF0..SOF15, minus DHT (C4), JPG (C8) and DAC (CC) which share the range.
fn is_start_of_frame(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, DecodeError> {
    match bytes.get(at..at + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(DecodeError::Truncated(at)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal JPEG header: SOI, APP0/JFIF, SOF0 with the given size, EOI.
    pub(crate) fn jpeg_fixture(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[
            0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01,
            0x00, 0x01, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[
            0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01,
        ]);
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        bytes
    }

    #[test]
    fn test_decode_reads_dimensions() {
        // Arrange
        let bytes = jpeg_fixture(1024, 768);

        // Act
        let bitmap = JpegFrameDecoder.decode(&bytes).unwrap();

        // Assert
        assert_eq!(bitmap.width, 1024);
        assert_eq!(bitmap.height, 768);
        assert_eq!(bitmap.image.data, bytes);
    }

    #[test]
    fn test_decode_empty_frame_fails() {
        assert_eq!(JpegFrameDecoder.decode(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn test_decode_rejects_non_jpeg() {
        assert_eq!(
            JpegFrameDecoder.decode(b"\x89PNG\r\n"),
            Err(DecodeError::NotJpeg)
        );
    }

    #[test]
    fn test_decode_truncated_header_fails() {
        let bytes = jpeg_fixture(640, 480);
        let cut = &bytes[..24];
        assert!(matches!(
            JpegFrameDecoder.decode(cut),
            Err(DecodeError::Truncated(_))
        ));
    }

    #[test]
    fn test_decode_scan_before_frame_header_fails() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02];
        assert_eq!(
            JpegFrameDecoder.decode(&bytes),
            Err(DecodeError::MissingFrameHeader)
        );
    }

    #[test]
    fn test_decode_skips_fill_bytes() {
        // Arrange: extra 0xFF padding before the SOF0 marker
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xFF, 0xFF, 0xC0, 0x00, 0x11, 0x08];
        bytes.extend_from_slice(&[0x00, 0x10, 0x00, 0x20]);

        // Act
        let bitmap = JpegFrameDecoder.decode(&bytes).unwrap();

        // Assert
        assert_eq!((bitmap.width, bitmap.height), (32, 16));
    }

    #[test]
    fn test_decode_progressive_frame_header() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xC2, 0x00, 0x11, 0x08];
        bytes.extend_from_slice(&[0x02, 0x58, 0x03, 0x20]);
        let bitmap = JpegFrameDecoder.decode(&bytes).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (800, 600));
    }

    #[test]
    fn test_decode_zero_width_fails() {
        let bytes = jpeg_fixture(0, 480);
        assert_eq!(
            JpegFrameDecoder.decode(&bytes),
            Err(DecodeError::ZeroDimension {
                width: 0,
                height: 480
            })
        );
    }

    #[test]
    fn test_dht_marker_is_not_a_frame_header() {
        assert!(!is_start_of_frame(0xC4));
        assert!(is_start_of_frame(0xC0));
        assert!(is_start_of_frame(0xC1));
    }
}
