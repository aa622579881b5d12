//! Result types of the local-to-remote migration.

use serde::{Deserialize, Serialize};

/// How the overall `success` flag of a migration run is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// Success if at least one record was migrated.
    ///
    /// A run that migrates 1 of 50 records is reported as a success. This is
    /// the historical behaviour of the admin panel's migrate button.
    #[default]
    AnyMigrated,
    /// Success only if the run recorded no errors at all.
    NoErrors,
}

/// Outcome of one migration run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MigrationResult {
    pub success: bool,
    pub migrated: usize,
    pub errors: Vec<String>,
    pub details: Vec<String>,
}

impl MigrationResult {
    /// Successful run with nothing to migrate.
    #[must_use]
    pub fn nothing_to_migrate() -> Self {
        Self {
            success: true,
            migrated: 0,
            errors: Vec::new(),
            details: vec!["No local trips found to migrate".to_owned()],
        }
    }

    /// Set `success` from the counters according to `policy`.
    pub fn finish(&mut self, policy: SuccessPolicy) {
        self.success = match policy {
            SuccessPolicy::AnyMigrated => self.migrated > 0,
            SuccessPolicy::NoErrors => self.errors.is_empty(),
        };
    }
}

/// Outcome of clearing the remote trips table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearOutcome {
    pub success: bool,
    pub message: String,
}

/// Count comparison between the local mirror and the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub local_count: usize,
    pub remote_count: Option<usize>,
    pub matches: bool,
    /// Always explains that only counts were compared.
    pub note: String,
}

/// Caveat attached to every [`VerifyReport`].
pub const COUNT_ONLY_NOTE: &str =
    "count-only check: equal counts do not prove the remote rows match the local trips";

impl VerifyReport {
    /// Compare two counts.
    #[must_use]
    pub fn compare(local_count: usize, remote_count: usize) -> Self {
        Self {
            local_count,
            remote_count: Some(remote_count),
            matches: local_count == remote_count,
            note: COUNT_ONLY_NOTE.to_owned(),
        }
    }

    /// Report for a remote count that could not be fetched.
    #[must_use]
    pub fn remote_unavailable(local_count: usize, error: &str) -> Self {
        Self {
            local_count,
            remote_count: None,
            matches: false,
            note: format!("{COUNT_ONLY_NOTE}; remote count failed: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_migrated_ignores_errors() {
        let mut result = MigrationResult {
            migrated: 1,
            errors: vec!["Failed to migrate \"x\"".to_owned(); 49],
            ..MigrationResult::default()
        };
        result.finish(SuccessPolicy::AnyMigrated);
        assert!(result.success);
    }

    #[test]
    fn test_no_errors_policy_is_strict() {
        let mut result = MigrationResult {
            migrated: 49,
            errors: vec!["boom".to_owned()],
            ..MigrationResult::default()
        };
        result.finish(SuccessPolicy::NoErrors);
        assert!(!result.success);
    }

    #[test]
    fn test_zero_migrated_is_failure_under_default_policy() {
        let mut result = MigrationResult::default();
        result.finish(SuccessPolicy::AnyMigrated);
        assert!(!result.success);
    }

    #[test]
    fn test_verify_report_notes_limitation() {
        let report = VerifyReport::compare(3, 3);
        assert!(report.matches);
        assert!(report.note.contains("count-only"));

        let report = VerifyReport::remote_unavailable(3, "timeout");
        assert!(!report.matches);
        assert!(report.note.contains("timeout"));
    }
}
