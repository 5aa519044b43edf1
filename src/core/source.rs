//! Fetch seam between the aggregator and the parsing service
//!
//! The aggregator only needs catalogs and result pages. [`HttpClient`](crate::core::client::HttpClient)
//! is the production implementation; tests supply in-memory doubles.

use std::future::Future;

use crate::core::error::TransportError;
use crate::entities::{ResultPage, TestMetadata};

/// Read access to per-file catalogs and paged results
pub trait DataSource {
    /// Test catalog of one file
    fn test_list(&self, file: &str) -> impl Future<Output = Result<Vec<TestMetadata>, TransportError>>;

    /// One page (1-based) of results for a test in one file
    fn results_page(
        &self,
        file: &str,
        test_num: u32,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<ResultPage, TransportError>>;
}
