//! Start-up sweep over pending intents, and a read-only audit.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactRecord;
use crate::coordinator::UploadCoordinator;
use crate::error::Result;
use crate::journal::{Intent, IntentOperation};

/// What a sweep did. Every examined intent lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub examined: usize,
    /// Both stores already agreed; the intent was only closed.
    pub completed: usize,
    /// Half-finished create rolled back by deleting its row.
    pub compensated: usize,
    /// Half-finished delete rolled forward by deleting its row.
    pub finished: usize,
    /// Create that never reached the catalog; a stray blob was removed.
    pub blobs_removed: usize,
    /// Left pending after an error; retried on the next sweep.
    pub failed: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.examined == 0
    }
}

/// Divergence found by [`UploadCoordinator::audit`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditReport {
    /// Records whose blob is missing.
    pub orphan_records: Vec<ArtifactRecord>,
    /// Stored keys that no record points at.
    pub orphan_blobs: Vec<String>,
}

impl AuditReport {
    pub fn is_consistent(&self) -> bool {
        self.orphan_records.is_empty() && self.orphan_blobs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Compensated,
    Finished,
    BlobRemoved,
}

impl UploadCoordinator {
    /// Settle every pending intent.
    ///
    /// Must run before requests are served: an in-flight operation looks
    /// exactly like an interrupted one.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let pending = self.journal.pending().await?;
        let mut report = ReconcileReport {
            examined: pending.len(),
            ..Default::default()
        };

        for intent in pending {
            match self.settle_intent(&intent).await {
                Ok(outcome) => {
                    tracing::info!(
                        intent = %intent.id,
                        operation = %intent.operation,
                        path = %intent.blob_path(),
                        ?outcome,
                        "intent reconciled"
                    );
                    match outcome {
                        Outcome::Completed => report.completed += 1,
                        Outcome::Compensated => report.compensated += 1,
                        Outcome::Finished => report.finished += 1,
                        Outcome::BlobRemoved => report.blobs_removed += 1,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        intent = %intent.id,
                        operation = %intent.operation,
                        path = %intent.blob_path(),
                        "failed to reconcile intent: {e}"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn settle_intent(&self, intent: &Intent) -> Result<Outcome> {
        let record = match intent.artifact_id {
            Some(id) => self.catalog.get_by_id(&id).await?,
            None => self
                .catalog
                .get_by_name(&intent.name)
                .await?
                .filter(|r| r.file_type == intent.file_type),
        };
        let path = intent.blob_path();
        let blob_present = self.blob_exists(&path).await?;

        let outcome = match (intent.operation, record, blob_present) {
            (IntentOperation::Create, Some(_), true) => Outcome::Completed,
            (IntentOperation::Create, Some(record), false) => {
                self.catalog.delete_by_id(&record.id).await?;
                Outcome::Compensated
            }
            (IntentOperation::Create, None, true) => {
                self.blobs.delete(&path).await?;
                Outcome::BlobRemoved
            }
            (IntentOperation::Create, None, false) => Outcome::Completed,
            (IntentOperation::Delete, Some(record), false) => {
                self.catalog.delete_by_id(&record.id).await?;
                Outcome::Finished
            }
            (IntentOperation::Delete, Some(_), true) => Outcome::Completed,
            (IntentOperation::Delete, None, _) => Outcome::Completed,
        };

        self.journal.complete(&intent.id).await?;
        Ok(outcome)
    }

    /// Read-only scan for records without blobs and blobs without records.
    pub async fn audit(&self) -> Result<AuditReport> {
        let records = self.catalog.list_all().await?;
        let stored: HashSet<String> = self.blobs.list().await?.into_iter().collect();

        let expected: HashSet<String> = records.iter().map(|r| r.blob_path().key()).collect();

        let orphan_records: Vec<_> = records
            .into_iter()
            .filter(|r| !stored.contains(&r.blob_path().key()))
            .collect();
        let mut orphan_blobs: Vec<_> = stored
            .into_iter()
            .filter(|key| !expected.contains(key))
            .collect();
        orphan_blobs.sort();

        if !orphan_records.is_empty() || !orphan_blobs.is_empty() {
            tracing::warn!(
                orphan_records = orphan_records.len(),
                orphan_blobs = orphan_blobs.len(),
                "audit found diverged uploads"
            );
        }

        Ok(AuditReport {
            orphan_records,
            orphan_blobs,
        })
    }
}
