//! Data model for records served by the parsing service

pub mod file;
pub mod metadata;
pub mod result;
pub mod summary;
pub mod wafer;

pub use file::{FileInfo, FileList, ParseJob, ParseProgress, ParseStatus, UploadReceipt};
pub use metadata::{TestList, TestMetadata};
pub use result::{within_limits, ResultPage, ResultRecord};
pub use summary::{FileSummary, HardBinInfo, MirInfo, MrrInfo, SiteYield};
pub use wafer::{Die, WaferData, PASS_BIN};
