//! Shared helper functions for CLI commands
//!
//! Client construction, merge gating and test selection used by the
//! commands that read result sets.

use std::io::{self, IsTerminal};

use console::style;
use dialoguer::{theme::ColorfulTheme, MultiSelect};
use miette::{IntoDiagnostic, Result};
use tracing::warn;

use crate::cli::GlobalOpts;
use crate::core::{
    ensure_mergeable, Config, HttpClient, Notice, NoticeLevel, ProgramIdentity, SourceFile,
    ValidationError, MAX_SELECTED_TESTS,
};
use crate::entities::TestMetadata;

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Optional number with fixed precision, `-` when missing
pub fn format_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Load config with the `--server` flag applied and build a client
pub fn connect(global: &GlobalOpts) -> Result<(Config, HttpClient)> {
    let config = Config::load().with_server(global.server.as_deref());
    let client = HttpClient::new(&config).into_diagnostic()?;
    Ok((config, client))
}

/// Reject oversized selections before anything goes over the wire
pub fn check_selection_size(tests: &[u32]) -> Result<()> {
    let mut unique = tests.to_vec();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() > MAX_SELECTED_TESTS {
        return Err(ValidationError::SelectionCap {
            requested: unique.len(),
            max: MAX_SELECTED_TESTS,
        })
        .into_diagnostic();
    }
    Ok(())
}

/// Decide which files feed the catalog
///
/// Merging needs more than one file and `--merge`; the files' program
/// identities are compared first. On a mismatch a warning is printed and only
/// the first file is used. Returns the files and whether merge mode is on.
pub async fn resolve_sources(
    client: &HttpClient,
    files: &[String],
    merge: bool,
) -> Result<(Vec<SourceFile>, bool)> {
    let first = files
        .first()
        .ok_or(ValidationError::NoFiles)
        .into_diagnostic()?;

    if !merge || files.len() < 2 {
        if files.len() > 1 {
            eprintln!(
                "{} {} files given without --merge; using {}",
                style("!").yellow(),
                files.len(),
                style(first).cyan()
            );
        }
        return Ok((
            vec![SourceFile::new(first.clone(), ProgramIdentity::default())],
            false,
        ));
    }

    let sources = client.source_files(files).await.into_diagnostic()?;
    match ensure_mergeable(&sources) {
        Ok(()) => Ok((sources, true)),
        Err(err) => {
            warn!(%err, "merge rejected");
            print_notice(&Notice::warning(
                "merge",
                format!("{}; showing {} only", err, first),
            ));
            Ok((sources.into_iter().take(1).collect(), false))
        }
    }
}

/// Tests to load: the `--test` list, or an interactive pick on a terminal
pub fn choose_tests(catalog: &[TestMetadata], requested: &[u32]) -> Result<Vec<u32>> {
    if !requested.is_empty() {
        return Ok(requested.to_vec());
    }

    if !io::stdin().is_terminal() || catalog.is_empty() {
        return Err(miette::miette!(
            "No tests selected. Pass --test with up to {} test numbers",
            MAX_SELECTED_TESTS
        ));
    }

    let labels: Vec<String> = catalog.iter().map(|t| t.label()).collect();
    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Select up to {} tests", MAX_SELECTED_TESTS))
        .items(&labels)
        .interact()
        .into_diagnostic()?;

    let tests: Vec<u32> = picked.into_iter().map(|i| catalog[i].test_num).collect();
    check_selection_size(&tests)?;
    Ok(tests)
}

/// Print one notice to stderr
pub fn print_notice(notice: &Notice) {
    let marker = match notice.level {
        NoticeLevel::Info => style("i").cyan(),
        NoticeLevel::Warning => style("!").yellow(),
        NoticeLevel::Error => style("✗").red(),
    };
    eprintln!("{} {}: {}", marker, style(&notice.scope).bold(), notice.message);
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        print_notice(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ÄÖÜäöü", 5), "ÄÖ...");
    }

    #[test]
    fn test_format_opt() {
        assert_eq!(format_opt(Some(1.23456), 3), "1.235");
        assert_eq!(format_opt(None, 3), "-");
    }

    #[test]
    fn test_selection_size() {
        assert!(check_selection_size(&[1, 2, 3, 4, 5, 6, 7, 8]).is_ok());
        assert!(check_selection_size(&[1, 1, 2, 3, 4, 5, 6, 7, 8]).is_ok());
        let err = check_selection_size(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap_err();
        assert!(err.to_string().contains("Cannot select more than 8 tests"));
    }

    #[test]
    fn test_choose_tests_uses_requested() {
        let catalog = vec![TestMetadata::new(1)];
        assert_eq!(choose_tests(&catalog, &[7, 3]).unwrap(), vec![7, 3]);
    }
}
