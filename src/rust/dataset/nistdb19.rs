use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use log::{debug, info};
use ndarray::Array3;

use super::builder::DatasetBuilder;
use super::class_map::{
    class_folder_name, partition_folder_name, test_folder_name, DataType, WRITER_PARTITIONS,
};
use super::error::DatasetError;
use super::utils::{array_to_image, read_image};
use super::Dataset;

/// Image transform applied lazily by [`NistDb19Dataset::get`].
pub type Transform = Arc<dyn Fn(DynamicImage) -> DynamicImage + Send + Sync>;

/// One (image, label) pair.
#[derive(Debug, Clone)]
pub struct Sample {
    pub image: DynamicImage,
    pub label: char,
}

/// NIST Special Database 19, "by class" layout.
///
/// All samples are decoded when the dataset is built and kept in memory
/// as two parallel sequences: pixel arrays and their labels.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use nistdb19::{Dataset, DataType, NistDb19Dataset};
///
/// let dataset = NistDb19Dataset::builder()
///     .with_root_dir("~/data/sd19")
///     .with_data_type(DataType::Digits)
///     .size_limit(5)
///     .build()?;
///
/// let sample = dataset.get(0)?;
/// println!("{} samples, first label {}", dataset.len(), sample.label);
/// # Ok(())
/// # }
/// ```
pub struct NistDb19Dataset {
    pub(crate) root_dir: PathBuf,
    pub(crate) train: bool,
    pub(crate) data_type: DataType,
    pub(crate) per_class_cap: usize,
    pub(crate) images: Vec<Array3<u8>>,
    pub(crate) labels: Vec<char>,
    pub(crate) transform: Option<Transform>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<NistDb19Dataset>();
    }
};

impl fmt::Debug for NistDb19Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NistDb19Dataset")
            .field("root_dir", &self.root_dir)
            .field("train", &self.train)
            .field("data_type", &self.data_type)
            .field("per_class_cap", &self.per_class_cap)
            .field("len", &self.labels.len())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl NistDb19Dataset {
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    pub(crate) fn empty(root_dir: PathBuf, train: bool, data_type: DataType, per_class_cap: usize) -> Self {
        Self {
            root_dir,
            train,
            data_type,
            per_class_cap,
            images: Vec::new(),
            labels: Vec::new(),
            transform: None,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn is_train(&self) -> bool {
        self.train
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Per-class sample limit in effect for the training partitions.
    pub fn per_class_cap(&self) -> usize {
        self.per_class_cap
    }

    pub fn images(&self) -> &[Array3<u8>] {
        &self.images
    }

    pub fn labels(&self) -> &[char] {
        &self.labels
    }

    /// Number of samples per label, in label order.
    pub fn class_counts(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for &label in &self.labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    pub fn set_transform<F>(&mut self, transform: F)
    where
        F: Fn(DynamicImage) -> DynamicImage + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    /// Walks `by_class/<hex>/...` for every class of the selected data type.
    ///
    /// Training mode scans `hsf_0` to `hsf_7` in order and stops a class as
    /// soon as `per_class_cap` samples were collected for it. Test mode reads
    /// the single `train_<hex>` folder in full.
    pub(crate) fn collect_samples(&mut self, extracted_dir: &Path) -> Result<(), DatasetError> {
        for label in self.data_type.labels() {
            let class_dir = extracted_dir.join(class_folder_name(label));
            let before = self.labels.len();

            if self.train {
                let mut collected = 0;
                for partition in 0..WRITER_PARTITIONS {
                    if collected >= self.per_class_cap {
                        break;
                    }
                    let dir = class_dir.join(partition_folder_name(partition));
                    collected = self.add_samples_from_dir(&dir, label, collected, Some(self.per_class_cap))?;
                }
            } else {
                let dir = class_dir.join(test_folder_name(label));
                self.add_samples_from_dir(&dir, label, 0, None)?;
            }

            info!("Collected {} samples for class '{}'", self.labels.len() - before, label);
        }
        Ok(())
    }

    /// Appends samples from one directory, in listing order, until `limit`
    /// is reached. Returns the updated per-class count.
    fn add_samples_from_dir(
        &mut self,
        dir: &Path,
        label: char,
        mut collected: usize,
        limit: Option<usize>,
    ) -> Result<usize, DatasetError> {
        debug!("Scanning {:?} for class '{}'", dir, label);
        for entry in fs::read_dir(dir)? {
            if limit.is_some_and(|limit| collected >= limit) {
                break;
            }
            let path = entry?.path();
            let pixels = read_image(&path)?;
            self.images.push(pixels);
            self.labels.push(label);
            collected += 1;
        }
        Ok(collected)
    }
}

impl Dataset for NistDb19Dataset {
    type Item = Sample;

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, index: usize) -> Result<Sample, DatasetError> {
        let (pixels, label) = self
            .images
            .get(index)
            .zip(self.labels.get(index))
            .ok_or(DatasetError::IndexOutOfBounds { index, len: self.len() })?;

        let mut image = array_to_image(pixels)?;
        if let Some(transform) = &self.transform {
            image = transform(image);
        }
        Ok(Sample { image, label: *label })
    }
}
