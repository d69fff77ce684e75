//! Batch records and checkpoint histories
//!
//! Each `drugId` maps to at most one immutable [`BatchRecord`] for the life
//! of the ledger. Checkpoints may only be appended to a batch that exists,
//! and are returned in append order.

use crate::facts::LedgerFact;
use pharmtrace_core::{BatchRecord, CheckpointEntry, LedgerError, LedgerResult};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchEntry {
    record: BatchRecord,
    history: Vec<CheckpointEntry>,
}

/// Registration record and custody chain of one batch, read together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProvenance {
    /// Registration record
    pub record: BatchRecord,
    /// Checkpoints in append order
    pub history: Vec<CheckpointEntry>,
}

/// Append-only batch store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchLedger {
    batches: HashMap<String, BatchEntry>,
}

impl BatchLedger {
    /// Whether a batch is registered under `drug_id`
    pub fn contains(&self, drug_id: &str) -> bool {
        self.batches.contains_key(drug_id)
    }

    /// Number of registered batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether no batch has been registered
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Registration record for `drug_id`
    pub fn get_details(&self, drug_id: &str) -> LedgerResult<&BatchRecord> {
        self.entry(drug_id).map(|entry| &entry.record)
    }

    /// Checkpoints for `drug_id` in append order; empty if none yet
    pub fn get_history(&self, drug_id: &str) -> LedgerResult<&[CheckpointEntry]> {
        self.entry(drug_id).map(|entry| entry.history.as_slice())
    }

    /// Record and history from the same state
    pub fn provenance(&self, drug_id: &str) -> LedgerResult<BatchProvenance> {
        let entry = self.entry(drug_id)?;
        Ok(BatchProvenance {
            record: entry.record.clone(),
            history: entry.history.clone(),
        })
    }

    fn entry(&self, drug_id: &str) -> LedgerResult<&BatchEntry> {
        self.batches
            .get(drug_id)
            .ok_or_else(|| LedgerError::batch_not_found(drug_id))
    }

    pub(crate) fn stage_registration(&self, record: BatchRecord) -> LedgerResult<LedgerFact> {
        record.drug.validate()?;
        if self.contains(record.drug_id()) {
            return Err(LedgerError::duplicate_batch(record.drug_id()));
        }
        Ok(LedgerFact::BatchRegistered { record })
    }

    pub(crate) fn stage_checkpoint(
        &self,
        drug_id: &str,
        entry: CheckpointEntry,
    ) -> LedgerResult<LedgerFact> {
        if entry.location.trim().is_empty() {
            return Err(LedgerError::missing_field("location"));
        }
        self.entry(drug_id)?;
        Ok(LedgerFact::CheckpointAppended {
            drug_id: drug_id.to_string(),
            entry,
        })
    }

    /// Returns false, leaving the existing record untouched, if `drugId` is taken.
    pub(crate) fn apply_registration(&mut self, record: BatchRecord) -> bool {
        match self.batches.entry(record.drug_id().to_string()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(BatchEntry {
                    record,
                    history: Vec::new(),
                });
                true
            }
        }
    }

    /// Returns false if the batch does not exist.
    pub(crate) fn apply_checkpoint(&mut self, drug_id: &str, entry: CheckpointEntry) -> bool {
        match self.batches.get_mut(drug_id) {
            Some(batch) => {
                batch.history.push(entry);
                true
            }
            None => false,
        }
    }
}
