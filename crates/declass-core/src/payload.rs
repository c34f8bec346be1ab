//! Uploaded image payloads.
//!
//! Uploads arrive as hex strings. The recognizer reads images from disk, so
//! each call decodes the payload into its own scratch file that is removed
//! when the [`ScratchImage`] is dropped.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::PayloadError;

/// Raw bytes of an uploaded document scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    /// Wrap raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, PayloadError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(PayloadError::Empty);
        }
        Ok(Self { bytes })
    }

    /// Decode a hex string. Surrounding whitespace is ignored, digits may be
    /// upper or lower case.
    pub fn from_hex(encoded: &str) -> Result<Self, PayloadError> {
        let digits = encoded.trim();
        let bytes = hex::decode(digits).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => PayloadError::InvalidDigit {
                digit: c,
                position: index,
            },
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                PayloadError::OddLength(digits.len())
            }
        })?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the payload to a uniquely named file in `dir`.
    pub fn write_scratch(&self, dir: &Path) -> Result<ScratchImage, PayloadError> {
        let mut file = tempfile::Builder::new()
            .prefix("declass-")
            .suffix(".img")
            .tempfile_in(dir)
            .map_err(PayloadError::Scratch)?;

        file.write_all(&self.bytes).map_err(PayloadError::Scratch)?;
        file.flush().map_err(PayloadError::Scratch)?;

        debug!(
            "Wrote {} byte scratch image to {}",
            self.bytes.len(),
            file.path().display()
        );

        Ok(ScratchImage { file })
    }
}

/// A decoded image on disk for the duration of one extraction call.
#[derive(Debug)]
pub struct ScratchImage {
    file: NamedTempFile,
}

impl ScratchImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
