//! Loader for NIST Special Database 19, the handwritten character corpus
//! published by NIST (<https://www.nist.gov/srd/nist-special-database-19>).
//!
//! The loader makes sure the `by_class.zip` archive is present and intact,
//! walks the extracted `by_class/<hex>/hsf_<n>` folders of one class block
//! and keeps the decoded images in memory as indexable (image, label) pairs.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nistdb19::{Dataset, DataType, NistDb19Dataset};
//!
//! let dataset = NistDb19Dataset::builder()
//!     .with_root_dir("data/sd19")
//!     .download(true)
//!     .with_data_type(DataType::CapLetters)
//!     .size_limit(2600)
//!     .size_limit_per_class(false) // 100 per letter
//!     .build()?;
//!
//! for index in 0..dataset.len() {
//!     let sample = dataset.get(index)?;
//!     assert!(sample.label.is_ascii_uppercase());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Snapshots
//!
//! Decoding the corpus takes a while, so a built dataset can be written to a
//! compressed file and restored later without touching the source tree:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use nistdb19::{DataType, NistDb19Dataset};
//! # let dataset = NistDb19Dataset::builder().with_data_type(DataType::Digits).build()?;
//! nistdb19::save_to_file(&dataset, "digits.sd19.gz", false)?;
//! let restored = nistdb19::load_from_file("digits.sd19.gz")?;
//! assert_eq!(restored.labels(), dataset.labels());
//! # Ok(())
//! # }
//! ```

pub mod confirm;
pub mod dataset;
pub mod source_manager;

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm, TerminalPrompt};
pub use dataset::{
    load_from_file, save_to_file, DataType, Dataset, DatasetBuilder, DatasetError, NistDb19Dataset,
    Sample, Transform,
};
pub use source_manager::{Checksum, SourceError, SourceInfo, SourceManager};

pub fn init_logger() {
    env_logger::init();
}
