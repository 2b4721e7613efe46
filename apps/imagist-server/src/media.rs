use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Provenance of a stored file, encoded as a filename prefix so the flat
/// directory stays self-describing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Generated,
    Input,
    Error,
    Temp,
}

impl ImageKind {
    fn prefix(self) -> &'static str {
        match self {
            ImageKind::Generated => "",
            ImageKind::Input => "input_",
            ImageKind::Error => "error_",
            ImageKind::Temp => "temp_",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct MediaRecord {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
    pub created_at: f64,
}

/// Flat directory of image files addressed by random filename. Writes
/// never collide and nothing updates in place, so no locking is needed;
/// concurrent listings are eventually consistent.
#[derive(Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: PathBuf) -> io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn url_for(filename: &str) -> String {
        format!("/images/{filename}")
    }

    /// Write bytes to a freshly named file and return its serving URL.
    pub async fn save(&self, bytes: &[u8], kind: ImageKind) -> io::Result<StoredImage> {
        let filename = format!("{}{}.png", kind.prefix(), Uuid::new_v4());
        tokio::fs::write(self.dir.join(&filename), bytes).await?;
        Ok(StoredImage {
            url: Self::url_for(&filename),
            filename,
        })
    }

    /// Duplicate an existing stored file under a new name of the given kind.
    pub async fn copy(&self, source: &str, kind: ImageKind) -> io::Result<StoredImage> {
        let from = self
            .resolve(source)
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, source.to_string()))?;
        let filename = format!("{}{}.png", kind.prefix(), Uuid::new_v4());
        tokio::fs::copy(from, self.dir.join(&filename)).await?;
        Ok(StoredImage {
            url: Self::url_for(&filename),
            filename,
        })
    }

    /// Best-effort removal; failures are logged and swallowed.
    pub async fn delete(&self, filename: &str) {
        let Some(path) = sanitize(filename).map(|name| self.dir.join(name)) else {
            return;
        };
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != io::ErrorKind::NotFound {
                debug!(
                    target: "imagist::media",
                    file = %path.display(),
                    error = %err,
                    "media cleanup failed"
                );
            }
        }
    }

    /// Map a bare filename back to an existing on-disk path. Separators and
    /// parent components are rejected outright.
    pub async fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let name = sanitize(filename)?;
        let path = self.dir.join(name);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Some(path),
            _ => None,
        }
    }

    /// Directory scan over image files, newest first.
    pub async fn list(&self) -> io::Result<Vec<MediaRecord>> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let filename = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !has_image_extension(&filename) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            records.push(MediaRecord {
                url: Self::url_for(&filename),
                filename,
                size_bytes: metadata.len(),
                created_at: metadata
                    .created()
                    .or_else(|_| metadata.modified())
                    .map(epoch_seconds)
                    .unwrap_or(0.0),
            });
        }
        records.sort_by(|a, b| b.created_at.total_cmp(&a.created_at));
        Ok(records)
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn sanitize(filename: &str) -> Option<&str> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return None;
    }
    Some(filename)
}

fn has_image_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or(0.0)
}
