use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use log::info;

use super::class_map::{per_class_cap, DataType};
use super::error::DatasetError;
use super::nistdb19::{NistDb19Dataset, Transform};
use crate::confirm::{Confirm, TerminalPrompt};
use crate::source_manager::{SourceInfo, SourceManager};

/// A builder for constructing a [`NistDb19Dataset`] with a fluent interface.
///
/// Only the data type is required. Everything else defaults to the
/// training partitions of the official NIST archive, no download, and a
/// limit of 1000 samples per class.
pub struct DatasetBuilder {
    root_dir: Option<PathBuf>,
    train: bool,
    download: bool,
    data_type: Option<DataType>,
    size_limit: usize,
    size_limit_per_class: bool,
    transform: Option<Transform>,
    source: SourceInfo,
    confirm: Box<dyn Confirm>,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub const DEFAULT_SIZE_LIMIT: usize = 1000;

    pub fn new() -> Self {
        Self {
            root_dir: None,
            train: true,
            download: false,
            data_type: None,
            size_limit: Self::DEFAULT_SIZE_LIMIT,
            size_limit_per_class: true,
            transform: None,
            source: SourceInfo::nist(),
            confirm: Box::new(TerminalPrompt),
        }
    }

    /// Directory holding the archive and its extracted `by_class` folder.
    /// A leading `~` component is expanded to the current user's home
    /// directory; `~user` forms are not resolved and are taken literally.
    /// Defaults to [`SourceManager::get_default_root_dir`], which is created
    /// if needed.
    pub fn with_root_dir<P: AsRef<Path>>(mut self, root_dir: P) -> Self {
        self.root_dir = Some(root_dir.as_ref().to_path_buf());
        self
    }

    /// Use the training partitions (`hsf_0`..`hsf_7`) if `true`,
    /// the test partition (`train_<hex>`) otherwise.
    pub fn train(mut self, train: bool) -> Self {
        self.train = train;
        self
    }

    /// Download the archive if it is not in the root directory yet.
    pub fn download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// If `false`, `size_limit` is divided evenly between the classes.
    pub fn size_limit_per_class(mut self, per_class: bool) -> Self {
        self.size_limit_per_class = per_class;
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(DynamicImage) -> DynamicImage + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Fetch from a mirror or a differently named archive.
    pub fn with_source(mut self, source: SourceInfo) -> Self {
        self.source = source;
        self
    }

    /// Strategy consulted before a corrupted archive is deleted.
    pub fn with_confirm(mut self, confirm: Box<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    /// Validates the configuration, makes sure the source is in place and
    /// loads every selected sample into memory.
    pub fn build(mut self) -> Result<NistDb19Dataset, DatasetError> {
        let data_type = self.data_type.ok_or_else(|| {
            DatasetError::Config(
                "Argument 'data_type' is required: one of digits, cap_letters, low_letters".to_string(),
            )
        })?;

        let root_dir = match self.root_dir.take() {
            Some(path) => expand_home(&path),
            None => {
                let default_dir = SourceManager::get_default_root_dir();
                fs::create_dir_all(&default_dir)?;
                default_dir
            }
        };
        if !root_dir.is_dir() {
            return Err(DatasetError::RootNotFound(root_dir));
        }

        let cap = per_class_cap(self.size_limit, self.size_limit_per_class, data_type);
        info!(
            "Loading {} ({} partition) from {:?}, up to {} samples per class",
            data_type,
            if self.train { "train" } else { "test" },
            root_dir,
            cap
        );

        let manager = SourceManager::new(&root_dir, self.source);
        manager.ensure_source(self.download, &mut *self.confirm)?;

        let mut dataset = NistDb19Dataset::empty(root_dir, self.train, data_type, cap);
        dataset.transform = self.transform;
        dataset.collect_samples(&manager.get_extracted_path())?;

        info!("Loaded {} samples", dataset.labels.len());
        Ok(dataset)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
