use std::fmt;

use thiserror::Error;

use crate::schema::StorageKind;

/// One field or entity a generation pass could not emit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateIssue {
    #[error("{entity}.{field}: no client type for {storage:?} storage")]
    UnmappableField {
        entity: String,
        field: String,
        storage: StorageKind,
    },
    #[error("{entity}: no fields left to emit")]
    EmptyEntity { entity: String },
}

/// Failure of a generation pass. Carries every offender found in the pass,
/// not just the first.
#[derive(Debug)]
pub struct GenerateError {
    issues: Vec<GenerateIssue>,
}

impl GenerateError {
    pub(crate) fn new(issues: Vec<GenerateIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[GenerateIssue] {
        &self.issues
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type generation failed with {} issue(s):",
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerateError {}
