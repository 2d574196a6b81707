//! Image content to upload

use crate::error::{ImageApiError, Result};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A file the host application has already received and opened
#[derive(Debug)]
pub struct UploadedFile {
    file: std::fs::File,
    real_path: PathBuf,
}

impl UploadedFile {
    pub fn new(file: std::fs::File, real_path: impl Into<PathBuf>) -> Self {
        Self {
            file,
            real_path: real_path.into(),
        }
    }

    /// Open the file at `path` as an uploaded file
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let real_path = path.into();
        let file = std::fs::File::open(&real_path)?;
        Ok(Self { file, real_path })
    }

    pub fn real_path(&self) -> &Path {
        &self.real_path
    }
}

/// Content source accepted by upload and update
#[derive(Debug)]
pub enum ImageSource {
    /// Already-open uploaded file
    Uploaded(UploadedFile),
    /// Path on the local filesystem
    Path(PathBuf),
}

impl ImageSource {
    /// Real filesystem path backing this source
    pub fn path(&self) -> &Path {
        match self {
            ImageSource::Uploaded(upload) => upload.real_path(),
            ImageSource::Path(path) => path,
        }
    }

    /// Read the full content. Any failure is a validation error.
    pub async fn read(&self) -> Result<Vec<u8>> {
        let path = self.path();
        if !path.is_file() {
            return Err(unreachable_photo(format!(
                "{} does not exist or is not a file",
                path.display()
            )));
        }

        match self {
            ImageSource::Uploaded(upload) => {
                let handle = upload
                    .file
                    .try_clone()
                    .map_err(|e| unreachable_photo(e.to_string()))?;
                let mut file = tokio::fs::File::from_std(handle);
                file.seek(SeekFrom::Start(0))
                    .await
                    .map_err(|e| unreachable_photo(e.to_string()))?;

                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes)
                    .await
                    .map_err(|e| unreachable_photo(e.to_string()))?;
                Ok(bytes)
            }
            ImageSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| unreachable_photo(e.to_string())),
        }
    }
}

fn unreachable_photo(cause: String) -> ImageApiError {
    ImageApiError::Validation(format!(
        "Photo could not be uploaded. Cannot reach or find photo. ({})",
        cause
    ))
}

impl From<UploadedFile> for ImageSource {
    fn from(upload: UploadedFile) -> Self {
        ImageSource::Uploaded(upload)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<&str> for ImageSource {
    fn from(path: &str) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}

impl From<String> for ImageSource {
    fn from(path: String) -> Self {
        ImageSource::Path(PathBuf::from(path))
    }
}
