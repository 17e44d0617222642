use std::io;
use std::path::PathBuf;

use crate::source_manager::SourceError;

/// Errors raised while building, indexing or persisting a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Invalid or missing construction argument
    #[error("Configuration error: {0}")]
    Config(String),
    /// The root directory passed to the builder does not exist
    #[error("Path '{}' doesn't exist", .0.display())]
    RootNotFound(PathBuf),
    /// The directory a snapshot should be written into does not exist
    #[error("Folder '{}' does not exist", .0.display())]
    DestinationNotFound(PathBuf),
    /// The snapshot file to load does not exist
    #[error("Can't open '{}'. File doesn't exist", .0.display())]
    SnapshotNotFound(PathBuf),
    #[error("Index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// A sample file could not be decoded
    #[error("Failed to decode image '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Pixel array error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    /// A stored pixel array has no image equivalent
    #[error("Unsupported pixel array shape {0:?} (height, width, channels)")]
    PixelLayout((usize, usize, usize)),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<bincode::Error> for DatasetError {
    fn from(err: bincode::Error) -> Self {
        DatasetError::Snapshot(err.to_string())
    }
}
