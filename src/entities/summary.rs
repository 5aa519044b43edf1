//! File summary - MIR/MRR records plus part and bin totals

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Master Information Record fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirInfo {
    pub setup_time: String,
    pub start_time: String,
    pub station_number: u32,
    pub mode_code: String,
    pub lot_id: String,
    pub part_type: String,
    pub node_name: String,
    pub tester_type: String,
    pub job_name: String,
    pub exec_type: String,
    pub exec_ver: String,
    pub facility_id: String,
    pub floor_id: String,
    pub process_id: String,
}

/// Master Results Record fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MrrInfo {
    pub finish_time: String,
    pub disposition_code: String,
    pub user_description: String,
    pub exec_description: String,
}

/// Part totals for one test site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteYield {
    pub site_num: u16,
    pub total_parts: u64,
    pub pass_count: u64,
    pub fail_count: u64,
    pub yield_rate: f64,
}

/// Hard bin population and the tests that failed into it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HardBinInfo {
    pub bin_num: u32,
    pub count: u64,
    pub percent: f64,
    pub failed_tests: Vec<String>,
}

/// Body of `GET /summary/{filename}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSummary {
    pub mir: Option<MirInfo>,
    pub mrr: Option<MrrInfo>,
    pub total_parts: u64,
    pub pass_count: u64,
    pub fail_count: u64,
    pub yield_rate: f64,
    pub sites: Vec<u16>,
    pub site_yields: Vec<SiteYield>,
    pub hbin_counts: BTreeMap<u32, u64>,
    pub hbin_details: Vec<HardBinInfo>,
    pub total_tests: u64,
}

impl FileSummary {
    /// Percentage of all parts that landed in a bin, formatted to two decimals
    pub fn bin_percent(&self, count: u64) -> String {
        if self.total_parts == 0 {
            return "0.00%".to_string();
        }
        format!("{:.2}%", count as f64 / self.total_parts as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_with_string_bin_keys() {
        let json = r#"{
            "mir": {"job_name": "JOB1", "exec_ver": "2.1", "station_number": 3},
            "total_parts": 200, "pass_count": 180, "fail_count": 20, "yield_rate": 90.0,
            "hbin_counts": {"1": 180, "4": 20},
            "total_tests": 12
        }"#;
        let summary: FileSummary = serde_json::from_str(json).unwrap();
        let mir = summary.mir.as_ref().unwrap();
        assert_eq!(mir.job_name, "JOB1");
        assert_eq!(mir.tester_type, "");
        assert_eq!(summary.hbin_counts.get(&4), Some(&20));
        assert!(summary.mrr.is_none());
    }

    #[test]
    fn test_bin_percent() {
        let summary = FileSummary {
            total_parts: 200,
            ..Default::default()
        };
        assert_eq!(summary.bin_percent(20), "10.00%");
        assert_eq!(FileSummary::default().bin_percent(5), "0.00%");
    }
}
