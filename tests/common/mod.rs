#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env};
use image::{GrayImage, Luma};
use nistdb19::{Checksum, DataType, SourceInfo};
use tempfile::TempDir;

const ARCHIVE_BYTES: &[u8] = b"stand-in for by_class.zip";

// Initialize test logger
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// A root directory with a verified archive and an extracted `by_class` tree.
pub struct Fixture {
    pub dir: TempDir,
    pub source: SourceInfo,
}

impl Fixture {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn class_dir(&self, label: char) -> PathBuf {
        self.root().join("by_class").join(format!("{:x}", label as u32))
    }
}

/// Pixel value encoding where a sample came from.
pub fn marker(partition: usize, index: usize) -> u8 {
    (partition * 16 + index) as u8
}

pub fn partition_of(value: u8) -> usize {
    value as usize / 16
}

pub fn write_png(path: &Path, value: u8) {
    GrayImage::from_pixel(4, 4, Luma([value])).save(path).unwrap();
}

/// Builds a fixture for `data_type` where writer partition `p` of every
/// class holds `per_partition(p)` images and the test folder holds `test_count`.
pub fn fixture(data_type: DataType, per_partition: impl Fn(usize) -> usize, test_count: usize) -> Fixture {
    init();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("by_class.zip"), ARCHIVE_BYTES).unwrap();

    let checksum = Checksum::Sha256(String::new())
        .digest_reader(ARCHIVE_BYTES)
        .unwrap();
    let source = SourceInfo {
        url: "http://127.0.0.1:9/by_class.zip".to_string(),
        archive_name: "by_class.zip".to_string(),
        checksum: Checksum::Sha256(checksum),
    };

    let fixture = Fixture { dir, source };
    for label in data_type.labels() {
        let class_dir = fixture.class_dir(label);
        for partition in 0..nistdb19::dataset::WRITER_PARTITIONS {
            let partition_dir = class_dir.join(format!("hsf_{}", partition));
            fs::create_dir_all(&partition_dir).unwrap();
            for index in 0..per_partition(partition) {
                write_png(&partition_dir.join(format!("{}_{}.png", partition, index)), marker(partition, index));
            }
        }

        let test_dir = class_dir.join(format!("train_{:x}", label as u32));
        fs::create_dir_all(&test_dir).unwrap();
        for index in 0..test_count {
            write_png(&test_dir.join(format!("t_{}.png", index)), marker(9, index));
        }
    }
    fixture
}
