use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Generate,
    Edit,
    Chat,
}

impl EntryKind {
    fn as_str(self) -> &'static str {
        match self {
            EntryKind::Generate => "generate",
            EntryKind::Edit => "edit",
            EntryKind::Chat => "chat",
        }
    }
}

/// One event record. Immutable after write; never deleted by this system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub created_at: f64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub prompt: String,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_image_path: Option<String>,
}

impl HistoryEntry {
    pub fn new(kind: EntryKind, prompt: &str, response_text: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: now.to_rfc3339(),
            created_at: now.timestamp_millis() as f64 / 1000.0,
            kind,
            prompt: prompt.to_string(),
            response_text: response_text.to_string(),
            image_path: None,
            input_image_path: None,
        }
    }
}

/// Append-only collection of JSON records, one file per entry. Retrieval
/// is a full directory scan; there is no index.
#[derive(Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: PathBuf) -> io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize to a new `{type}_{id}.json` file. No merge, no
    /// update-in-place.
    pub async fn append(&self, entry: &HistoryEntry) -> io::Result<()> {
        let filename = format!("{}_{}.json", entry.kind.as_str(), entry.id);
        let body = serde_json::to_vec_pretty(entry).map_err(io::Error::other)?;
        tokio::fs::write(self.dir.join(filename), body).await
    }

    /// Parse every JSON file in the directory, skip (and log) unparseable
    /// ones, and return entries sorted by `created_at` descending.
    pub async fn list_all(&self) -> io::Result<Vec<HistoryEntry>> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(file) = dir.next_entry().await? {
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(
                        target: "imagist::history",
                        file = %path.display(),
                        error = %err,
                        "skipping unreadable history file"
                    );
                    continue;
                }
            };
            match serde_json::from_slice::<HistoryEntry>(&bytes) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(
                        target: "imagist::history",
                        file = %path.display(),
                        error = %err,
                        "skipping unparseable history file"
                    );
                }
            }
        }
        entries.sort_by(|a, b| b.created_at.total_cmp(&a.created_at));
        Ok(entries)
    }
}
