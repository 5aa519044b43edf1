//! Test metadata - one entry of a file's test catalog

use serde::{Deserialize, Serialize};

/// Catalog entry describing one parametric test of a test program
///
/// Built per source file by the parsing service. A merged catalog is
/// derived from several of these lists and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetadata {
    /// Test number, unique within a catalog
    pub test_num: u32,

    /// Test description
    #[serde(default)]
    pub test_txt: String,

    /// Measurement units
    #[serde(default)]
    pub units: String,

    /// Lower specification limit
    #[serde(default)]
    pub lo_limit: Option<f64>,

    /// Upper specification limit
    #[serde(default)]
    pub hi_limit: Option<f64>,

    /// Number of executions recorded
    #[serde(default)]
    pub count: u64,

    /// Percentage of executions outside the limits (0-100)
    #[serde(default)]
    pub fail_rate: f64,
}

impl TestMetadata {
    /// Create an entry with only a test number; every other field empty
    pub fn new(test_num: u32) -> Self {
        Self {
            test_num,
            test_txt: String::new(),
            units: String::new(),
            lo_limit: None,
            hi_limit: None,
            count: 0,
            fail_rate: 0.0,
        }
    }

    /// One-line label used by pickers and listings
    pub fn label(&self) -> String {
        format!(
            "#{} - {} ({} results, {}% fail rate)",
            self.test_num, self.test_txt, self.count, self.fail_rate
        )
    }
}

/// Body of `GET /test-list/{filename}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestList {
    #[serde(default)]
    pub tests: Vec<TestMetadata>,
}
