//! STA: STDF test analytics
//!
//! Client-side analytics for semiconductor test data held by an STDF parsing
//! service: catalog merging across files, capability statistics, histograms,
//! wafer map projection and CSV export.

pub mod cli;
pub mod core;
pub mod entities;
