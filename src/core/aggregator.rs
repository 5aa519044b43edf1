//! Result set aggregation across pages and files
//!
//! The aggregator owns the loaded catalog and a [`ResultStore`] keyed by test
//! number. A test's results stay cached exactly as long as the test is
//! selected: leaving the selection evicts the entry, joining it triggers one
//! fetch. Fetches for different files run concurrently; pages of one file are
//! fetched in order because the page count is only known after page 1.
//!
//! Completions are committed through [`ResultSetAggregator::complete`], which
//! drops results for tests that left the selection (or were re-selected and
//! fetched again) while the request was in flight.

use std::collections::BTreeMap;

use futures::future::{join_all, try_join_all};
use tracing::{debug, info, warn};

use crate::core::catalog::merge_catalogs;
use crate::core::error::{AnalyticsError, TransportError, ValidationError};
use crate::core::histogram::{build_histogram, Histogram};
use crate::core::identity::{ensure_mergeable, SourceFile};
use crate::core::notice::Notice;
use crate::core::source::DataSource;
use crate::core::stats::{capability_stats, CapabilityStats};
use crate::entities::{ResultRecord, TestMetadata};

/// Most tests that may be selected at once
pub const MAX_SELECTED_TESTS: usize = 8;

/// Records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 5000;

/// Cache entry for one selected test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedResults {
    pub results: Vec<ResultRecord>,
    pub loading: bool,
    /// Message of the failed fetch, if any; failed entries are not retried
    pub error: Option<String>,
    generation: u64,
}

/// Handle for one outstanding fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub test_num: u32,
    generation: u64,
}

/// Selection and per-test cache, mutated only through its transitions
#[derive(Debug, Default)]
pub struct ResultStore {
    selection: Vec<u32>,
    entries: BTreeMap<u32, CachedResults>,
    next_generation: u64,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected test numbers in selection order
    pub fn selection(&self) -> &[u32] {
        &self.selection
    }

    pub fn is_selected(&self, test_num: u32) -> bool {
        self.selection.contains(&test_num)
    }

    pub fn get(&self, test_num: u32) -> Option<&CachedResults> {
        self.entries.get(&test_num)
    }

    /// Test numbers that currently have a cache entry
    pub fn cached_tests(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    /// Replace the selection
    ///
    /// Entries for tests no longer selected are evicted. Newly selected tests
    /// get a loading entry and a ticket; tests already cached get nothing.
    /// Over the cap, nothing changes.
    pub fn select(&mut self, test_nums: &[u32]) -> Result<Vec<FetchTicket>, ValidationError> {
        let mut selection: Vec<u32> = Vec::with_capacity(test_nums.len());
        for &n in test_nums {
            if !selection.contains(&n) {
                selection.push(n);
            }
        }
        if selection.len() > MAX_SELECTED_TESTS {
            return Err(ValidationError::SelectionCap {
                requested: selection.len(),
                max: MAX_SELECTED_TESTS,
            });
        }

        self.entries.retain(|n, _| selection.contains(n));

        let mut tickets = Vec::new();
        for &test_num in &selection {
            if self.entries.contains_key(&test_num) {
                continue;
            }
            self.next_generation += 1;
            let generation = self.next_generation;
            self.entries.insert(
                test_num,
                CachedResults {
                    loading: true,
                    generation,
                    ..Default::default()
                },
            );
            tickets.push(FetchTicket {
                test_num,
                generation,
            });
        }

        self.selection = selection;
        Ok(tickets)
    }

    /// Commit a finished fetch
    ///
    /// Returns `false` and changes nothing when the ticket is stale: the test
    /// left the selection, or was evicted and fetched again since.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: Result<Vec<ResultRecord>, String>) -> bool {
        if !self.is_selected(ticket.test_num) {
            return false;
        }
        let Some(entry) = self.entries.get_mut(&ticket.test_num) else {
            return false;
        };
        if entry.generation != ticket.generation || !entry.loading {
            return false;
        }

        entry.loading = false;
        match outcome {
            Ok(results) => {
                entry.results = results;
                entry.error = None;
            }
            Err(message) => {
                entry.results = Vec::new();
                entry.error = Some(message);
            }
        }
        true
    }

    /// Drop the selection and every entry
    pub fn clear(&mut self) {
        self.selection.clear();
        self.entries.clear();
    }
}

/// Result of running one ticket against the data source
#[derive(Debug)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<Vec<ResultRecord>, TransportError>,
    /// Rows the service reported beyond what a single-file fetch retrieved
    pub truncated_total: Option<u64>,
}

/// Catalog loading, test selection and cached result sets for one view
pub struct ResultSetAggregator<S> {
    source: S,
    page_size: u32,
    files: Vec<String>,
    merge_mode: bool,
    catalog: Vec<TestMetadata>,
    store: ResultStore,
    notices: Vec<Notice>,
}

impl<S: DataSource> ResultSetAggregator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            files: Vec::new(),
            merge_mode: false,
            catalog: Vec::new(),
            store: ResultStore::new(),
            notices: Vec::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn catalog(&self) -> &[TestMetadata] {
        &self.catalog
    }

    /// Files backing the current catalog (one unless merging)
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn merge_mode(&self) -> bool {
        self.merge_mode
    }

    /// Whether exported rows need to say which file they came from
    pub fn is_multi_file(&self) -> bool {
        self.merge_mode && self.files.len() > 1
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn selection(&self) -> &[u32] {
        self.store.selection()
    }

    pub fn test_info(&self, test_num: u32) -> Option<&TestMetadata> {
        self.catalog.iter().find(|t| t.test_num == test_num)
    }

    /// Load the catalog for a set of files
    ///
    /// In merge mode every file must share one program identity; otherwise
    /// the call is rejected before any request and the caller should fall back
    /// to a single file. Without merge mode only the first file is used.
    /// A successful load clears the selection and cache.
    pub async fn load_catalog(
        &mut self,
        files: &[SourceFile],
        merge_mode: bool,
    ) -> Result<&[TestMetadata], AnalyticsError> {
        let first = files.first().ok_or(ValidationError::NoFiles)?;
        if merge_mode {
            if let Err(err) = ensure_mergeable(files) {
                self.notices.push(Notice::warning("merge", err.to_string()));
                return Err(err.into());
            }
        }

        let active: Vec<String> = if merge_mode {
            files.iter().map(|f| f.name.clone()).collect()
        } else {
            vec![first.name.clone()]
        };

        let lists = join_all(active.iter().map(|f| self.source.test_list(f))).await;
        let mut catalogs = Vec::with_capacity(lists.len());
        for (file, list) in active.iter().zip(lists) {
            match list {
                Ok(list) => catalogs.push(list),
                Err(err) => {
                    self.notices.push(Notice::error(file.clone(), err.to_string()));
                    return Err(err.into());
                }
            }
        }

        self.catalog = if merge_mode {
            merge_catalogs(catalogs.iter().map(|c| c.as_slice()))
        } else {
            catalogs.into_iter().next().unwrap_or_default()
        };
        info!(
            files = active.len(),
            tests = self.catalog.len(),
            merge_mode,
            "catalog loaded"
        );

        self.files = active;
        self.merge_mode = merge_mode;
        self.store.clear();
        Ok(&self.catalog)
    }

    /// Validate and apply a new selection, returning the fetches it needs
    pub fn begin_selection(&mut self, test_nums: &[u32]) -> Result<Vec<FetchTicket>, ValidationError> {
        if let Some(&unknown) = test_nums.iter().find(|&&n| self.test_info(n).is_none()) {
            let err = ValidationError::UnknownTest(unknown);
            self.notices.push(Notice::warning("selection", err.to_string()));
            return Err(err);
        }

        match self.store.select(test_nums) {
            Ok(tickets) => {
                debug!(
                    selection = ?self.store.selection(),
                    fetches = tickets.len(),
                    "selection changed"
                );
                Ok(tickets)
            }
            Err(err) => {
                warn!(%err, "selection rejected");
                self.notices.push(Notice::warning(
                    "selection",
                    format!("{}; keeping the current selection", err),
                ));
                Err(err)
            }
        }
    }

    /// Fetch every record for one ticket's test
    pub async fn fetch(&self, ticket: FetchTicket) -> FetchOutcome {
        let test_num = ticket.test_num;

        if self.merge_mode {
            let per_file = try_join_all(
                self.files
                    .iter()
                    .map(|file| self.fetch_all_pages(file, test_num)),
            )
            .await;
            return FetchOutcome {
                ticket,
                result: per_file.map(|sets| sets.into_iter().flatten().collect()),
                truncated_total: None,
            };
        }

        let Some(file) = self.files.first() else {
            return FetchOutcome {
                ticket,
                result: Ok(Vec::new()),
                truncated_total: None,
            };
        };

        // Single-file mode reads only the first page.
        match self.source.results_page(file, test_num, 1, self.page_size).await {
            Ok(page) => {
                let fetched = page.results.len() as u64;
                let truncated_total = (page.total > fetched).then_some(page.total);
                if let Some(total) = truncated_total {
                    warn!(file = %file, test_num, fetched, total, "results truncated to first page");
                }
                FetchOutcome {
                    ticket,
                    result: Ok(tag_records(page.results, file)),
                    truncated_total,
                }
            }
            Err(err) => FetchOutcome {
                ticket,
                result: Err(err),
                truncated_total: None,
            },
        }
    }

    async fn fetch_all_pages(&self, file: &str, test_num: u32) -> Result<Vec<ResultRecord>, TransportError> {
        let first = self.source.results_page(file, test_num, 1, self.page_size).await?;
        let pages = first.total.div_ceil(self.page_size as u64);
        let mut records = first.results;
        for page in 2..=pages {
            let next = self
                .source
                .results_page(file, test_num, page as u32, self.page_size)
                .await?;
            records.extend(next.results);
        }
        debug!(file, test_num, pages, records = records.len(), "fetched all pages");
        Ok(tag_records(records, file))
    }

    /// Commit a fetch outcome; `false` if it was stale and discarded
    pub fn complete(&mut self, outcome: FetchOutcome) -> bool {
        let test_num = outcome.ticket.test_num;
        let scope = format!("test {}", test_num);
        let failed = outcome.result.as_ref().err().map(|e| e.to_string());

        let committed = self
            .store
            .complete(outcome.ticket, outcome.result.map_err(|e| e.to_string()));
        if !committed {
            debug!(test_num, "discarding stale fetch result");
            return false;
        }

        if let Some(message) = failed {
            warn!(test_num, %message, "fetch failed");
            self.notices.push(Notice::error(scope, message));
        } else if let Some(total) = outcome.truncated_total {
            let shown = self.records(test_num).len();
            self.notices.push(Notice::warning(
                scope,
                format!("showing the first {} of {} results", shown, total),
            ));
        }
        true
    }

    /// Replace the selection and fetch whatever is not cached yet
    ///
    /// Fetch failures are reported as notices and leave that test empty; they
    /// never affect the other tests.
    pub async fn select_tests(&mut self, test_nums: &[u32]) -> Result<(), ValidationError> {
        let tickets = self.begin_selection(test_nums)?;
        let outcomes = join_all(tickets.into_iter().map(|t| self.fetch(t))).await;
        for outcome in outcomes {
            self.complete(outcome);
        }
        Ok(())
    }

    /// Add one test to the selection
    pub async fn add_test(&mut self, test_num: u32) -> Result<(), ValidationError> {
        let mut next = self.store.selection().to_vec();
        next.push(test_num);
        self.select_tests(&next).await
    }

    /// Remove one test from the selection, evicting its results
    pub async fn remove_test(&mut self, test_num: u32) -> Result<(), ValidationError> {
        let next: Vec<u32> = self
            .store
            .selection()
            .iter()
            .copied()
            .filter(|&n| n != test_num)
            .collect();
        self.select_tests(&next).await
    }

    pub fn entry(&self, test_num: u32) -> Option<&CachedResults> {
        self.store.get(test_num)
    }

    /// Cached records of a test; empty when not selected, loading or failed
    pub fn records(&self, test_num: u32) -> &[ResultRecord] {
        self.store
            .get(test_num)
            .map(|e| e.results.as_slice())
            .unwrap_or_default()
    }

    /// Records of every selected test, in selection order
    pub fn selected_records(&self) -> impl Iterator<Item = &ResultRecord> {
        self.store
            .selection()
            .iter()
            .flat_map(move |&n| self.records(n).iter())
    }

    /// Statistics of a test's cached results against its catalog limits
    pub fn stats(&self, test_num: u32) -> Option<CapabilityStats> {
        let info = self.test_info(test_num)?;
        capability_stats(
            self.records(test_num).iter().map(|r| r.result),
            info.lo_limit,
            info.hi_limit,
        )
    }

    pub fn histogram(&self, test_num: u32) -> Option<Histogram> {
        build_histogram(self.records(test_num).iter().map(|r| r.result))
    }

    /// Drain accumulated notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

fn tag_records(records: Vec<ResultRecord>, file: &str) -> Vec<ResultRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.tagged(file, i))
        .collect()
}
