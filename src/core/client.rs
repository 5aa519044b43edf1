//! HTTP client for the STDF parsing service
//!
//! Endpoints are relative to the configured base URL (`.../api/stdf`):
//! `GET /files`, `POST /upload`, `POST /parse/{file}`, `GET /progress/{job}`,
//! `GET /summary/{file}`, `GET /results/{file}`, `GET /wafermap/{file}` and
//! `GET /test-list/{file}`. Error bodies carry a `detail` field.

use std::path::Path;
use std::time::Duration;

use futures::future::try_join_all;
use futures::StreamExt;
use reqwest::{multipart, Body, Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::error::{AnalyticsError, ParseJobError, TransportError, ValidationError};
use crate::core::identity::{ProgramIdentity, SourceFile};
use crate::core::source::DataSource;
use crate::entities::{
    FileInfo, FileList, FileSummary, ParseJob, ParseProgress, ParseStatus, ResultPage, TestList,
    TestMetadata, UploadReceipt, WaferData,
};

/// Accepted upload extensions
pub const STDF_EXTENSIONS: [&str; 2] = ["stdf", "std"];

const UPLOAD_CHUNK: usize = 64 * 1024;

/// Whether a path names an STDF file by extension (case-insensitive)
pub fn is_stdf_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STDF_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Upload progress as a whole percentage
pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as f64 * 100.0 / total as f64).round() as u64).min(100) as u8
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Client for one parsing service instance
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    poll_interval: Duration,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let raw = config.server.base_url.trim_end_matches('/');
        let base_url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl {
                url: raw.to_string(),
                message: "not a base URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.server.timeout_secs.max(1)))
            .build()
            .map_err(|source| TransportError::Request {
                url: raw.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url,
            poll_interval: config.poll_interval(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL with each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, TransportError> {
        let status = response.status();
        let body = response.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let url = self.endpoint(segments);
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        Self::read_json(&url, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, TransportError> {
        let url = self.endpoint(segments);
        debug!(%url, "POST");
        let response = self
            .client
            .post(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        Self::read_json(&url, response).await
    }

    /// Stored files, newest first
    pub async fn list_files(&self) -> Result<Vec<FileInfo>, TransportError> {
        let list: FileList = self.get_json(&["files"], &[]).await?;
        let mut files = list.files;
        files.sort_by(|a, b| b.modified.total_cmp(&a.modified));
        Ok(files)
    }

    /// Upload an STDF file, reporting `(sent, total)` bytes as the body streams
    pub async fn upload<F>(&self, path: &Path, mut on_progress: F) -> Result<UploadReceipt, AnalyticsError>
    where
        F: FnMut(u64, u64) + Send + 'static,
    {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_stdf_file(path) {
            return Err(ValidationError::UnsupportedFile(file_name).into());
        }

        let data = tokio::fs::read(path).await.map_err(|source| TransportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let total = data.len() as u64;
        let chunks: Vec<Vec<u8>> = data.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();

        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(sent, total);
            Ok::<_, std::io::Error>(chunk)
        });

        let url = self.endpoint(&["upload"]);
        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        let form = multipart::Form::new().part("file", part);

        info!(file = %file_name, bytes = total, "uploading");
        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;
        let mut receipt: UploadReceipt = Self::read_json(&url, response).await?;
        if receipt.filename.is_empty() {
            receipt.filename = file_name;
        }
        Ok(receipt)
    }

    /// Start (or join) the parse job for a stored file
    pub async fn start_parse(&self, file: &str) -> Result<ParseJob, TransportError> {
        self.post_json(&["parse", file]).await
    }

    pub async fn progress(&self, job_id: &str) -> Result<ParseProgress, TransportError> {
        self.get_json(&["progress", job_id], &[]).await
    }

    /// Start a parse job and poll it until it finishes
    ///
    /// `on_progress` sees every poll. A job that ends in `error` becomes a
    /// [`ParseJobError`].
    pub async fn wait_for_parse<F>(&self, file: &str, mut on_progress: F) -> Result<ParseProgress, AnalyticsError>
    where
        F: FnMut(&ParseProgress),
    {
        let job = self.start_parse(file).await?;
        info!(file, job_id = %job.job_id, "parse started");

        loop {
            let progress = self.progress(&job.job_id).await?;
            on_progress(&progress);
            match progress.status {
                ParseStatus::Done => {
                    info!(file, job_id = %job.job_id, "parse finished");
                    return Ok(progress);
                }
                ParseStatus::Error => {
                    return Err(ParseJobError {
                        job_id: job.job_id,
                        message: progress
                            .error
                            .unwrap_or_else(|| "unknown error".to_string()),
                    }
                    .into());
                }
                ParseStatus::Pending | ParseStatus::Running => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    pub async fn summary(&self, file: &str) -> Result<FileSummary, TransportError> {
        self.get_json(&["summary", file], &[]).await
    }

    pub async fn wafer_map(&self, file: &str) -> Result<WaferData, TransportError> {
        self.get_json(&["wafermap", file], &[]).await
    }

    /// Program identity from a file's MIR
    pub async fn identity(&self, file: &str) -> Result<ProgramIdentity, TransportError> {
        let summary = self.summary(file).await?;
        Ok(ProgramIdentity::from_mir(summary.mir.as_ref()))
    }

    /// Identities for several files, fetched concurrently
    pub async fn source_files(&self, files: &[String]) -> Result<Vec<SourceFile>, TransportError> {
        try_join_all(files.iter().map(|name| async move {
            let identity = self.identity(name).await?;
            Ok::<_, TransportError>(SourceFile::new(name.clone(), identity))
        }))
        .await
    }
}

impl DataSource for HttpClient {
    async fn test_list(&self, file: &str) -> Result<Vec<TestMetadata>, TransportError> {
        let list: TestList = self.get_json(&["test-list", file], &[]).await?;
        Ok(list.tests)
    }

    async fn results_page(
        &self,
        file: &str,
        test_num: u32,
        page: u32,
        page_size: u32,
    ) -> Result<ResultPage, TransportError> {
        self.get_json(
            &["results", file],
            &[
                ("test_num", test_num.to_string()),
                ("page", page.to_string()),
                ("page_size", page_size.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        let config = Config::default().with_server(Some(base));
        HttpClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://127.0.0.1:8000/api/stdf/");
        assert_eq!(
            client.endpoint(&["summary", "lot 7#a.stdf"]).as_str(),
            "http://127.0.0.1:8000/api/stdf/summary/lot%207%23a.stdf"
        );
        assert_eq!(
            client.endpoint(&["files"]).as_str(),
            "http://127.0.0.1:8000/api/stdf/files"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = Config::default().with_server(Some("not a url"));
        assert!(matches!(
            HttpClient::new(&config),
            Err(TransportError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_stdf_extension_check() {
        assert!(is_stdf_file(Path::new("lot7.stdf")));
        assert!(is_stdf_file(Path::new("dir/LOT7.STD")));
        assert!(!is_stdf_file(Path::new("lot7.csv")));
        assert!(!is_stdf_file(Path::new("stdf")));
    }

    #[test]
    fn test_upload_percent() {
        assert_eq!(upload_percent(0, 200), 0);
        assert_eq!(upload_percent(1, 200), 1);
        assert_eq!(upload_percent(200, 200), 100);
        assert_eq!(upload_percent(0, 0), 100);
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail": "file missing"}"#), "file missing");
        assert_eq!(
            error_detail(r#"{"detail": [{"loc": ["query"]}]}"#),
            r#"[{"loc":["query"]}]"#
        );
        assert_eq!(error_detail("Bad Gateway\n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_stdf_before_request() {
        let client = client("http://127.0.0.1:9/api/stdf");
        let err = client
            .upload(Path::new("notes.txt"), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Validation(ValidationError::UnsupportedFile(ref name)) if name == "notes.txt"
        ));
    }
}
