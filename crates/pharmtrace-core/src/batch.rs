//! Batch records, checkpoints and manufacturer status
//!
//! A batch is registered once and never edited. Its custody chain grows by
//! appending [`CheckpointEntry`] values in submission order.

use crate::errors::{LedgerError, LedgerResult};
use crate::identifiers::Identity;
use serde::{Deserialize, Serialize};

/// Descriptive fields of a drug batch, as submitted by a manufacturer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrugFields {
    /// Unique batch identifier (the ledger key)
    pub drug_id: String,
    /// Commercial drug name
    pub drug_name: String,
    /// Active ingredients
    pub composition: String,
    /// Dosage, e.g. `250mg`
    pub dosage: String,
    /// Manufacturer batch number
    pub batch_no: String,
    /// Expiry date as supplied by the manufacturer
    pub expiry_date: String,
}

impl DrugFields {
    /// Convenience constructor
    pub fn new(
        drug_id: impl Into<String>,
        drug_name: impl Into<String>,
        composition: impl Into<String>,
        dosage: impl Into<String>,
        batch_no: impl Into<String>,
        expiry_date: impl Into<String>,
    ) -> Self {
        Self {
            drug_id: drug_id.into(),
            drug_name: drug_name.into(),
            composition: composition.into(),
            dosage: dosage.into(),
            batch_no: batch_no.into(),
            expiry_date: expiry_date.into(),
        }
    }

    /// The ledger only requires a non-blank key; the request layer may ask for more.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.drug_id.trim().is_empty() {
            return Err(LedgerError::missing_field("drugId"));
        }
        Ok(())
    }
}

/// Immutable registration record for one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    /// Submitted drug fields
    #[serde(flatten)]
    pub drug: DrugFields,
    /// Identity the registration is attributed to
    pub registered_by: Identity,
    /// Unix seconds at commit time
    pub registered_at: u64,
}

impl BatchRecord {
    /// Batch identifier
    pub fn drug_id(&self) -> &str {
        &self.drug.drug_id
    }
}

/// One recorded custody event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    /// Free-form location label
    pub location: String,
    /// Caller-supplied timestamp, stored verbatim
    pub timestamp: String,
    /// Identity that submitted the checkpoint
    pub actor: Identity,
}

impl CheckpointEntry {
    /// Create a checkpoint entry
    pub fn new(location: impl Into<String>, timestamp: impl Into<String>, actor: Identity) -> Self {
        Self {
            location: location.into(),
            timestamp: timestamp.into(),
            actor,
        }
    }
}

/// Write permission state of a manufacturer identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManufacturerStatus {
    /// May register batches by signature
    Authorized,
    /// Previously authorized, now refused
    Revoked,
    /// Never seen by an admin
    #[default]
    Unknown,
}

impl ManufacturerStatus {
    /// Lowercase label used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Revoked => "revoked",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_drug_id_is_missing() {
        let drug = DrugFields::new("  ", "Amoxicillin", "Amoxicillin", "250mg", "B-002", "2027-01-01");
        assert_eq!(drug.validate(), Err(LedgerError::missing_field("drugId")));
    }

    #[test]
    fn drug_fields_use_camel_case_and_default_missing_fields() {
        let drug: DrugFields =
            serde_json::from_str(r#"{"drugId":"D1","batchNo":"B1","expiryDate":"2027-01-01"}"#)
                .unwrap();
        assert_eq!(drug.drug_id, "D1");
        assert_eq!(drug.batch_no, "B1");
        assert!(drug.drug_name.is_empty());
    }

    #[test]
    fn record_flattens_drug_fields() {
        let record = BatchRecord {
            drug: DrugFields::new("D1", "Name", "Comp", "10mg", "B1", "2030-01-01"),
            registered_by: Identity::from_bytes([2u8; 20]),
            registered_at: 1_700_000_000,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["drugId"], "D1");
        assert_eq!(value["registeredAt"], 1_700_000_000u64);
        let back: BatchRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn unknown_is_the_default_status() {
        assert_eq!(ManufacturerStatus::default(), ManufacturerStatus::Unknown);
        assert_eq!(ManufacturerStatus::Revoked.as_str(), "revoked");
    }
}
