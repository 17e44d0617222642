use std::path::{Path, PathBuf};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::env;
use std::time::Duration;
use md5::Md5;
use sha2::{Sha256, Digest};
use dirs;
use log;

use crate::confirm::Confirm;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Files not found at {0:?}. Enable download to fetch them.")]
    NotFound(PathBuf),
    #[error("Archive {0:?} is corrupted. Remove it and try again.")]
    Corrupted(PathBuf),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with HTTP status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Extraction error: {0}")]
    ExtractError(#[from] zip::result::ZipError),
    #[error("Hash mismatch: expected {expected}, got {actual} for {path:?}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Expected digest of an archive, as lowercase or uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    Md5(String),
    Sha256(String),
}

impl Checksum {
    pub fn expected(&self) -> &str {
        match self {
            Checksum::Md5(hex) | Checksum::Sha256(hex) => hex,
        }
    }

    /// Hashes everything `reader` yields with this checksum's algorithm.
    pub fn digest_reader<R: Read>(&self, reader: R) -> io::Result<String> {
        match self {
            Checksum::Md5(_) => hex_digest::<Md5, _>(reader),
            Checksum::Sha256(_) => hex_digest::<Sha256, _>(reader),
        }
    }

    pub fn digest_file(&self, path: &Path) -> io::Result<String> {
        let file = File::open(path)?;
        self.digest_reader(BufReader::new(file))
    }

    pub fn matches(&self, actual: &str) -> bool {
        self.expected().eq_ignore_ascii_case(actual)
    }
}

fn hex_digest<D: Digest + Write, R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = D::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect())
}

/// Where an archive comes from and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub url: String,
    pub archive_name: String,
    pub checksum: Checksum,
}

impl SourceInfo {
    pub const NIST_URL: &'static str = "https://s3.amazonaws.com/nist-srd/SD19/by_class.zip";
    pub const NIST_ARCHIVE: &'static str = "by_class.zip";
    pub const NIST_MD5: &'static str = "79572b1694a8506f2b722c7be54130c4";

    /// The official NIST Special Database 19 "by class" archive.
    pub fn nist() -> Self {
        Self {
            url: Self::NIST_URL.to_string(),
            archive_name: Self::NIST_ARCHIVE.to_string(),
            checksum: Checksum::Md5(Self::NIST_MD5.to_string()),
        }
    }

    /// Name of the directory the archive unpacks to: the archive name
    /// without its trailing four-character extension (`by_class.zip` -> `by_class`).
    pub fn extracted_name(&self) -> &str {
        let name = self.archive_name.as_str();
        match name.len().checked_sub(4) {
            Some(end) if name.is_char_boundary(end) && end > 0 => &name[..end],
            _ => name,
        }
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self::nist()
    }
}

/// Keeps the source archive under a root directory present, verified and unpacked.
#[derive(Debug, Clone)]
pub struct SourceManager {
    root_dir: PathBuf,
    info: SourceInfo,
}

impl SourceManager {
    /// Root directory used when none is given: `$NISTDB19_ROOT`, then the
    /// platform cache directory, then `~/.cache`, then the temp directory.
    pub fn get_default_root_dir() -> PathBuf {
        if let Ok(path) = env::var("NISTDB19_ROOT") {
            return PathBuf::from(path);
        }
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("nistdb19");
        }
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("nistdb19");
        }
        env::temp_dir().join("nistdb19")
    }

    pub fn new<P: AsRef<Path>>(root_dir: P, info: SourceInfo) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            info,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn get_archive_path(&self) -> PathBuf {
        self.root_dir.join(&self.info.archive_name)
    }

    pub fn get_extracted_path(&self) -> PathBuf {
        self.root_dir.join(self.info.extracted_name())
    }

    pub fn verify_archive(&self) -> Result<bool, SourceError> {
        let path = self.get_archive_path();
        if !path.exists() {
            return Ok(false);
        }
        self.verify_file(&path)
    }

    fn verify_file(&self, path: &Path) -> Result<bool, SourceError> {
        log::info!("Verifying file: {:?}", path);
        let hash = self.info.checksum.digest_file(path)?;
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", self.info.checksum.expected());
        Ok(self.info.checksum.matches(&hash))
    }

    /// Makes sure the archive exists, matches its checksum and is unpacked.
    ///
    /// A present but corrupted archive is only deleted (together with its
    /// extracted directory) and fetched again if `confirm` agrees. A missing
    /// archive is fetched only when `download` is set.
    pub fn ensure_source(&self, download: bool, confirm: &mut dyn Confirm) -> Result<(), SourceError> {
        let archive_path = self.get_archive_path();

        if archive_path.exists() {
            if self.verify_file(&archive_path)? {
                log::info!("Files already downloaded and verified");
                if !self.get_extracted_path().exists() {
                    log::info!("Extracted folder {:?} missing, extracting", self.get_extracted_path());
                    self.extract_archive()?;
                }
                return Ok(());
            }

            log::warn!("Archive {:?} failed checksum verification", archive_path);
            if !confirm.confirm("Archive corrupted. Delete and download it again") {
                return Err(SourceError::Corrupted(archive_path));
            }
            self.remove_download()?;
        } else if !download {
            return Err(SourceError::NotFound(archive_path));
        }

        self.download_and_verify()?;
        self.extract_archive()
    }

    /// Streams the archive to disk and checks it against the expected hash.
    pub fn download_and_verify(&self) -> Result<(), SourceError> {
        let url = &self.info.url;
        let path = self.get_archive_path();
        fs::create_dir_all(&self.root_dir)?;

        log::info!("Downloading {} to {:?}", url, path);
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        let mut response = client.get(url).send()?;
        log::info!("Download response status: {}", response.status());
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus {
                url: url.clone(),
                status: response.status(),
            });
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        let written = response.copy_to(&mut writer)?;
        writer.flush()?;
        drop(writer);
        log::info!("Downloaded {} bytes", written);

        let hash = self.info.checksum.digest_file(&path)?;
        if !self.info.checksum.matches(&hash) {
            log::error!("Hash mismatch: expected {}, got {}", self.info.checksum.expected(), hash);
            let _ = fs::remove_file(&path);
            return Err(SourceError::HashMismatch {
                path,
                expected: self.info.checksum.expected().to_string(),
                actual: hash,
            });
        }

        log::info!("Archive downloaded and verified successfully");
        Ok(())
    }

    /// Unpacks the ZIP archive into the root directory.
    pub fn extract_archive(&self) -> Result<(), SourceError> {
        let path = self.get_archive_path();
        log::info!("Extracting {:?} to {:?}", path, self.root_dir);
        let file = File::open(&path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
        archive.extract(&self.root_dir)?;
        log::info!("Extracted {} entries", archive.len());
        Ok(())
    }

    /// Deletes the archive and the directory it was extracted to, if present.
    pub fn remove_download(&self) -> Result<(), SourceError> {
        let archive_path = self.get_archive_path();
        let extracted_path = self.get_extracted_path();

        if archive_path.exists() {
            log::info!("Removing {:?}", archive_path);
            fs::remove_file(&archive_path)?;
        }
        if extracted_path.is_dir() {
            log::info!("Removing {:?}", extracted_path);
            fs::remove_dir_all(&extracted_path)?;
        } else if extracted_path.exists() {
            fs::remove_file(&extracted_path)?;
        }
        Ok(())
    }
}
