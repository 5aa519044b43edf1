//! Program identity - decides whether files may be merged
//!
//! Two files are comparable only when they were produced by the same test
//! program: same job name, executive type, executive version and tester type.

use serde::Serialize;

use crate::core::error::ValidationError;
use crate::entities::MirInfo;

/// Trimmed `{job_name, exec_type, exec_ver, tester_type}` of a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ProgramIdentity {
    pub job_name: String,
    pub exec_type: String,
    pub exec_ver: String,
    pub tester_type: String,
}

impl ProgramIdentity {
    pub fn new(job_name: &str, exec_type: &str, exec_ver: &str, tester_type: &str) -> Self {
        Self {
            job_name: job_name.trim().to_string(),
            exec_type: exec_type.trim().to_string(),
            exec_ver: exec_ver.trim().to_string(),
            tester_type: tester_type.trim().to_string(),
        }
    }

    /// Identity of a file's MIR; a file without a MIR has the empty identity
    pub fn from_mir(mir: Option<&MirInfo>) -> Self {
        match mir {
            Some(mir) => Self::new(&mir.job_name, &mir.exec_type, &mir.exec_ver, &mir.tester_type),
            None => Self::default(),
        }
    }

    /// Key string compared for mergeability
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.job_name, self.exec_type, self.exec_ver, self.tester_type
        )
    }
}

impl std::fmt::Display for ProgramIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A file name paired with the identity of the program that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub identity: ProgramIdentity,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, identity: ProgramIdentity) -> Self {
        Self {
            name: name.into(),
            identity,
        }
    }
}

/// Check that every file shares the first file's identity
///
/// Returns the first mismatch; there is no partial merge.
pub fn ensure_mergeable(files: &[SourceFile]) -> Result<(), ValidationError> {
    let first = files.first().ok_or(ValidationError::NoFiles)?;
    let first_key = first.identity.key();
    for other in &files[1..] {
        let other_key = other.identity.key();
        if other_key != first_key {
            return Err(ValidationError::IdentityMismatch {
                first_file: first.name.clone(),
                first: first_key,
                other_file: other.name.clone(),
                other: other_key,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mir(exec_ver: &str) -> MirInfo {
        MirInfo {
            job_name: " FT_MAIN ".to_string(),
            exec_type: "IG-XL".to_string(),
            exec_ver: exec_ver.to_string(),
            tester_type: "UltraFLEX\t".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_fields_are_trimmed() {
        let id = ProgramIdentity::from_mir(Some(&mir("9.0")));
        assert_eq!(id.key(), "FT_MAIN|IG-XL|9.0|UltraFLEX");
    }

    #[test]
    fn test_lot_and_timing_do_not_affect_identity() {
        let mut a = mir("9.0");
        a.lot_id = "LOT-A".to_string();
        a.start_time = "2024-01-01".to_string();
        let mut b = mir("9.0");
        b.lot_id = "LOT-B".to_string();
        assert_eq!(
            ProgramIdentity::from_mir(Some(&a)),
            ProgramIdentity::from_mir(Some(&b))
        );
    }

    #[test]
    fn test_differing_exec_ver_blocks_merge() {
        let files = vec![
            SourceFile::new("a.stdf", ProgramIdentity::from_mir(Some(&mir("9.0")))),
            SourceFile::new("b.stdf", ProgramIdentity::from_mir(Some(&mir("9.1")))),
        ];
        assert_ne!(files[0].identity.key(), files[1].identity.key());

        let err = ensure_mergeable(&files).unwrap_err();
        match err {
            ValidationError::IdentityMismatch { other_file, .. } => {
                assert_eq!(other_file, "b.stdf")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_matching_files_are_mergeable() {
        let id = ProgramIdentity::from_mir(Some(&mir("9.0")));
        let files = vec![
            SourceFile::new("a.stdf", id.clone()),
            SourceFile::new("b.stdf", id.clone()),
            SourceFile::new("c.stdf", id),
        ];
        assert!(ensure_mergeable(&files).is_ok());
    }

    #[test]
    fn test_no_files() {
        assert_eq!(ensure_mergeable(&[]), Err(ValidationError::NoFiles));
    }
}
