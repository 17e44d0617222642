mod builder;
mod class_map;
mod error;
mod nistdb19;
mod snapshot;
mod utils;

pub use builder::DatasetBuilder;
pub use class_map::{per_class_cap, DataType, WRITER_PARTITIONS};
pub use error::DatasetError;
pub use nistdb19::{NistDb19Dataset, Sample, Transform};
pub use snapshot::{load_from_file, save_to_file};

/// An indexable, length-queryable collection of samples.
pub trait Dataset {
    type Item;

    /// Total number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the sample at `index`, or [`DatasetError::IndexOutOfBounds`].
    fn get(&self, index: usize) -> Result<Self::Item, DatasetError>;
}
