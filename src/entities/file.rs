//! Stored files and parse jobs on the parsing service

use serde::{Deserialize, Serialize};

/// Entry of `GET /files`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    /// Modification time, epoch seconds
    #[serde(default)]
    pub modified: f64,
}

impl FileInfo {
    /// Size rendered as B, KB or MB
    pub fn display_size(&self) -> String {
        let bytes = self.size;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Modification time in local time, or the raw value if out of range
    pub fn display_modified(&self) -> String {
        chrono::DateTime::from_timestamp(self.modified.trunc() as i64, 0)
            .map(|utc| {
                utc.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| self.modified.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<FileInfo>,
}

/// Body of `POST /upload`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub filename: String,
}

/// Lifecycle of a parse job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseStatus::Pending => write!(f, "pending"),
            ParseStatus::Running => write!(f, "running"),
            ParseStatus::Done => write!(f, "done"),
            ParseStatus::Error => write!(f, "error"),
        }
    }
}

/// Body of `POST /parse/{filename}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseJob {
    pub job_id: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub status: Option<ParseStatus>,
}

/// Body of `GET /progress/{job_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseProgress {
    #[serde(default)]
    pub job_id: String,
    pub status: ParseStatus,
    #[serde(default)]
    pub percent: u8,
    #[serde(default)]
    pub error: Option<String>,
}
