//! Raw memory images.
//!
//! An image is nothing but memory contents: byte `i` of the file goes to
//! address `i`. There is no header and no metadata.

use crate::cpu::memory::MEMORY_SIZE;
use std::path::Path;
use thiserror::Error;

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;

    if bytes.len() > MEMORY_SIZE {
        return Err(ImageError::TooLarge { size: bytes.len() });
    }

    log::info!("read {} byte image from {}", bytes.len(), path.as_ref().display());
    Ok(bytes)
}

/// Save an image file to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &[u8]) -> Result<(), ImageError> {
    if image.len() > MEMORY_SIZE {
        return Err(ImageError::TooLarge { size: image.len() });
    }

    std::fs::write(path.as_ref(), image)
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur during image operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("image of {size} bytes does not fit in memory ({} bytes)", MEMORY_SIZE)]
    TooLarge { size: usize },
}
