//! Shared test helpers for integration tests

#![allow(dead_code)]

use std::cell::RefCell;

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

use sta::core::{DataSource, ProgramIdentity, SourceFile, TransportError};
use sta::entities::{ResultPage, ResultRecord, TestMetadata};

/// Address nothing listens on
pub const DEAD_SERVER: &str = "http://127.0.0.1:9/api/stdf";

/// Helper to get an sta command isolated from user config and env
pub fn sta(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("sta"));
    cmd.env("STA_CONFIG", config_dir.path().join("config.yaml"))
        .env("STA_SERVER_URL", DEAD_SERVER)
        .env_remove("STA_LOG")
        .env_remove("RUST_LOG");
    cmd
}

pub fn identity(exec_ver: &str) -> ProgramIdentity {
    ProgramIdentity::new("FT_MAIN", "IGXL", exec_ver, "UltraFLEX")
}

pub fn source(name: &str, exec_ver: &str) -> SourceFile {
    SourceFile::new(name, identity(exec_ver))
}

pub fn meta(test_num: u32, count: u64, fail_rate: f64) -> TestMetadata {
    TestMetadata {
        count,
        fail_rate,
        ..TestMetadata::new(test_num)
    }
}

pub fn record(test_num: u32, value: f64) -> ResultRecord {
    ResultRecord {
        test_num,
        site_num: 1,
        head_num: 1,
        result: Some(value),
        test_txt: String::new(),
        units: "V".to_string(),
        lo_limit: Some(1.0),
        hi_limit: Some(2.0),
        source_file: String::new(),
        row_key: String::new(),
    }
}

/// In-memory service: per-file catalogs and result lists, paged on request
#[derive(Default)]
pub struct MemorySource {
    pub catalogs: Vec<(String, Vec<TestMetadata>)>,
    pub results: Vec<(String, u32, Vec<ResultRecord>)>,
    pub requests: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn catalog(mut self, file: &str, tests: Vec<TestMetadata>) -> Self {
        self.catalogs.push((file.to_string(), tests));
        self
    }

    pub fn results(mut self, file: &str, test_num: u32, values: &[f64]) -> Self {
        let records = values.iter().map(|&v| record(test_num, v)).collect();
        self.results.push((file.to_string(), test_num, records));
        self
    }
}

impl DataSource for MemorySource {
    async fn test_list(&self, file: &str) -> Result<Vec<TestMetadata>, TransportError> {
        self.requests.borrow_mut().push(format!("test-list/{}", file));
        self.catalogs
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, tests)| tests.clone())
            .ok_or_else(|| TransportError::Status {
                url: format!("test-list/{}", file),
                status: 404,
                detail: format!("File {} not found", file),
            })
    }

    async fn results_page(
        &self,
        file: &str,
        test_num: u32,
        page: u32,
        page_size: u32,
    ) -> Result<ResultPage, TransportError> {
        self.requests
            .borrow_mut()
            .push(format!("results/{}?test_num={}&page={}", file, test_num, page));
        let all: Vec<ResultRecord> = self
            .results
            .iter()
            .find(|(f, n, _)| f == file && *n == test_num)
            .map(|(_, _, records)| records.clone())
            .unwrap_or_default();
        let start = ((page.saturating_sub(1)) * page_size) as usize;
        Ok(ResultPage {
            total: all.len() as u64,
            results: all.into_iter().skip(start).take(page_size as usize).collect(),
        })
    }
}
