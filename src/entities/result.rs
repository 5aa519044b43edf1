//! Result records - individual parametric measurements

use serde::{Deserialize, Serialize};

/// One measurement of one test on one part
///
/// `source_file` and `row_key` are not sent by the service; the aggregator
/// fills them in when the record is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_num: u32,

    #[serde(default)]
    pub site_num: u16,

    #[serde(default)]
    pub head_num: u16,

    /// Measured value; absent when the tester did not record one
    #[serde(default)]
    pub result: Option<f64>,

    #[serde(default)]
    pub test_txt: String,

    #[serde(default)]
    pub units: String,

    #[serde(default)]
    pub lo_limit: Option<f64>,

    #[serde(default)]
    pub hi_limit: Option<f64>,

    /// File the record was fetched from
    #[serde(default)]
    pub source_file: String,

    /// Stable identity for list rendering (`{source_file}:{index}`)
    #[serde(default)]
    pub row_key: String,
}

impl ResultRecord {
    /// Whether the value lies within the record's own limits
    ///
    /// Unset limits never fail. A record without a value is not a pass.
    pub fn passes(&self) -> bool {
        match self.result {
            Some(value) => within_limits(value, self.lo_limit, self.hi_limit),
            None => false,
        }
    }

    /// Tag the record with its origin and position within that origin
    pub fn tagged(mut self, source_file: &str, index: usize) -> Self {
        self.source_file = source_file.to_string();
        self.row_key = format!("{}:{}", source_file, index);
        self
    }
}

/// Pass rule shared by records and statistics: `(lo unset or x >= lo) and (hi unset or x <= hi)`
pub fn within_limits(value: f64, lo: Option<f64>, hi: Option<f64>) -> bool {
    lo.map_or(true, |lo| value >= lo) && hi.map_or(true, |hi| value <= hi)
}

/// Body of `GET /results/{filename}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPage {
    #[serde(default)]
    pub results: Vec<ResultRecord>,

    /// Total number of matching records across all pages
    #[serde(default)]
    pub total: u64,
}
