//! Export and import runs over a whole collection
//!
//! The two directions treat failures differently. An export stops at the
//! first object that cannot be fetched or written and reports how far it got.
//! An import records every failed object and keeps going until the directory
//! is exhausted.

mod export;
mod import;

use std::path::PathBuf;

use futures::stream::{Stream, StreamExt};

use crate::{CoreError, ObjectIdentifier, PipelineOutcome};

pub use export::{export_content, export_objects};
pub use import::{import_content, import_objects};

/// Result of a completed export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub collection: String,
    pub directory: PathBuf,
    /// Number of files written
    pub exported: usize,
    /// Names of the written files, in the order they were written
    pub files: Vec<String>,
}

/// An object that could not be imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedObject {
    /// Object identifier, or the file name when no identifier could be read
    pub label: String,
    /// HTTP status, if the failure was an answer from the remote service
    pub status: Option<u16>,
    pub reason: String,
}

/// Result of an import run: which objects made it and which did not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub collection: String,
    pub succeeded: Vec<ObjectIdentifier>,
    pub failed: Vec<FailedObject>,
}

impl ImportSummary {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Drain `outcomes` into a summary. Never fails; every failure is recorded.
    pub async fn collect<S>(collection: impl Into<String>, outcomes: S) -> Self
    where
        S: Stream<Item = PipelineOutcome>,
    {
        let mut summary = Self::new(collection);
        let mut outcomes = std::pin::pin!(outcomes);
        while let Some(outcome) = outcomes.next().await {
            summary.record(outcome);
        }
        summary
    }

    pub fn record(&mut self, outcome: PipelineOutcome) {
        match outcome {
            PipelineOutcome::Success(record) => self.succeeded.push(record.id),
            PipelineOutcome::Failure { label, error } => {
                let failed = FailedObject {
                    status: error.status(),
                    reason: describe(&error),
                    label,
                };
                tracing::warn!(
                    "couldn't import {} '{}' (status = {:?}): {}",
                    self.collection,
                    failed.label,
                    failed.status,
                    failed.reason
                );
                self.failed.push(failed);
            }
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// No object failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One-line description of an error and all of its causes.
fn describe(error: &CoreError) -> String {
    let mut description = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }

    if let CoreError::RemoteCall { body, .. } = error.root_cause() {
        if !body.is_empty() {
            description.push_str(&format!(" (response: {body})"));
        }
    }
    description
}
