use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{info, warn};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::class_map::DataType;
use super::error::DatasetError;
use super::nistdb19::NistDb19Dataset;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    root_dir: PathBuf,
    train: bool,
    data_type: DataType,
    per_class_cap: usize,
    images: Vec<Array3<u8>>,
    labels: Vec<char>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    root_dir: &'a Path,
    train: bool,
    data_type: DataType,
    per_class_cap: usize,
    images: &'a [Array3<u8>],
    labels: &'a [char],
}

/// Writes `dataset` (pixels, labels and configuration) to a gzip-compressed file.
///
/// An existing file is left untouched unless `force_overwrite` is set; in
/// that case a warning is logged and `Ok(false)` returned. The transform is
/// not persisted. Returns `Ok(true)` once the file was written.
pub fn save_to_file<P: AsRef<Path>>(
    dataset: &NistDb19Dataset,
    path: P,
    force_overwrite: bool,
) -> Result<bool, DatasetError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(DatasetError::DestinationNotFound(parent.to_path_buf()));
    }

    if !force_overwrite && path.exists() {
        warn!(
            "Can't save to {:?}: file already exists. Pass force_overwrite to replace it",
            path
        );
        return Ok(false);
    }

    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        root_dir: &dataset.root_dir,
        train: dataset.train,
        data_type: dataset.data_type,
        per_class_cap: dataset.per_class_cap,
        images: &dataset.images,
        labels: &dataset.labels,
    };

    // Written next to the destination and renamed into place, so a failed
    // save never leaves a truncated snapshot behind.
    let staging = NamedTempFile::new_in(parent)?;
    let mut encoder = GzEncoder::new(BufWriter::new(staging), Compression::best());
    bincode::serialize_into(&mut encoder, &snapshot)?;
    let staging = encoder
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| e.error)?;

    info!("Saved {} samples to {:?}", dataset.labels.len(), path);
    Ok(true)
}

/// Restores a dataset written by [`save_to_file`]. The restored dataset has no transform.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<NistDb19Dataset, DatasetError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DatasetError::SnapshotNotFound(path.to_path_buf()));
    }

    let decoder = GzDecoder::new(BufReader::new(File::open(path)?));
    let snapshot: Snapshot = bincode::deserialize_from(decoder)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(DatasetError::Snapshot(format!(
            "unsupported snapshot version {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }
    if snapshot.images.len() != snapshot.labels.len() {
        return Err(DatasetError::Snapshot(format!(
            "{} images but {} labels",
            snapshot.images.len(),
            snapshot.labels.len()
        )));
    }

    let mut dataset = NistDb19Dataset::empty(
        snapshot.root_dir,
        snapshot.train,
        snapshot.data_type,
        snapshot.per_class_cap,
    );
    dataset.images = snapshot.images;
    dataset.labels = snapshot.labels;

    info!("Loaded {} samples from {:?}", dataset.labels.len(), path);
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_dataset() -> NistDb19Dataset {
        let mut dataset = NistDb19Dataset::empty(PathBuf::from("/data/sd19"), false, DataType::CapLetters, 3);
        for (i, label) in "ABBA".chars().enumerate() {
            let mut pixels = Array3::<u8>::zeros((4, 4, 3));
            pixels[[i, i, 1]] = 255;
            dataset.images.push(pixels);
            dataset.labels.push(label);
        }
        dataset
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caps.gz");
        let dataset = sample_dataset();

        assert!(save_to_file(&dataset, &path, false).unwrap());
        let restored = load_from_file(&path).unwrap();

        assert_eq!(restored.labels(), dataset.labels());
        assert_eq!(restored.images(), dataset.images());
        assert_eq!(restored.data_type(), DataType::CapLetters);
        assert!(!restored.is_train());
        assert_eq!(restored.per_class_cap(), 3);
        assert_eq!(restored.root_dir(), Path::new("/data/sd19"));
    }

    #[test]
    fn test_existing_file_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caps.gz");
        fs::write(&path, b"keep me").unwrap();

        assert!(!save_to_file(&sample_dataset(), &path, false).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"keep me");

        assert!(save_to_file(&sample_dataset(), &path, true).unwrap());
        assert_eq!(load_from_file(&path).unwrap().labels().len(), 4);
    }

    #[test]
    fn test_failed_save_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();

        assert!(save_to_file(&sample_dataset(), &path, true).is_err());
        assert!(path.is_dir());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_overwrite_leaves_only_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caps.gz");
        assert!(save_to_file(&sample_dataset(), &path, false).unwrap());
        assert!(save_to_file(&sample_dataset(), &path, true).unwrap());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("caps.gz")]);
    }

    #[test]
    fn test_missing_destination_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("caps.gz");
        let err = save_to_file(&sample_dataset(), &path, true).unwrap_err();
        assert!(matches!(err, DatasetError::DestinationNotFound(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_file(dir.path().join("missing.gz")).unwrap_err();
        assert!(matches!(err, DatasetError::SnapshotNotFound(_)));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.gz");
        fs::write(&path, b"not a snapshot").unwrap();
        assert!(load_from_file(&path).is_err());
    }
}
