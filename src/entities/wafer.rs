//! Wafer die list as served by `GET /wafermap/{filename}`

use serde::{Deserialize, Serialize};

/// Hard bin reserved for good dies
pub const PASS_BIN: u32 = 1;

/// A single tested die position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    pub x_coord: i32,
    pub y_coord: i32,
    pub hard_bin: u32,
    #[serde(default)]
    pub soft_bin: u32,
    #[serde(default)]
    pub site_num: u16,
}

impl Die {
    pub fn is_pass(&self) -> bool {
        self.hard_bin == PASS_BIN
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaferData {
    #[serde(default)]
    pub wafer_id: String,

    /// Die count reported by the service (may differ from `dies.len()`)
    #[serde(default)]
    pub total_dies: u64,

    #[serde(default)]
    pub dies: Vec<Die>,
}
