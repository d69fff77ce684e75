//! Ledger configuration
//!
//! Loaded from TOML. The owner identity is fixed when the ledger is created
//! and is the only required field.

use pharmtrace_core::Identity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Who may call the direct (unsigned) `register` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Only admins (the system operator)
    OperatorOnly,
    /// Admins and currently authorized manufacturers
    #[default]
    OperatorOrAuthorized,
    /// Any caller
    Open,
}

/// Who may append checkpoints to an existing batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointPolicy {
    /// Any caller, as long as the batch exists
    #[default]
    Open,
    /// Admins and currently authorized manufacturers only
    Restricted,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("failed to access config file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse into a config
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config parsed but is unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Owner identity, always an admin
    pub owner: Identity,
    /// Additional admin identities
    #[serde(default)]
    pub admins: Vec<Identity>,
    /// Policy for direct registration
    #[serde(default)]
    pub registration_policy: RegistrationPolicy,
    /// Policy for checkpoint appends
    #[serde(default)]
    pub checkpoint_policy: CheckpointPolicy,
    /// Journal file; `None` keeps the ledger in memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_path: Option<PathBuf>,
}

impl LedgerConfig {
    /// Default policies with the given owner and no journal
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            admins: Vec::new(),
            registration_policy: RegistrationPolicy::default(),
            checkpoint_policy: CheckpointPolicy::default(),
            journal_path: None,
        }
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject zero identities anywhere in the admin set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_zero() {
            return Err(ConfigError::Invalid("owner must not be the zero identity".into()));
        }
        if self.admins.iter().any(Identity::is_zero) {
            return Err(ConfigError::Invalid("admins must not contain the zero identity".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn minimal_config_uses_default_policies() {
        let config = LedgerConfig::from_toml_str(&format!("owner = \"{OWNER}\"")).unwrap();
        assert_eq!(config.registration_policy, RegistrationPolicy::OperatorOrAuthorized);
        assert_eq!(config.checkpoint_policy, CheckpointPolicy::Open);
        assert!(config.journal_path.is_none());
    }

    #[test]
    fn policies_parse_from_snake_case() {
        let text = format!(
            "owner = \"{OWNER}\"\nregistration_policy = \"operator_only\"\ncheckpoint_policy = \"restricted\"\n"
        );
        let config = LedgerConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.registration_policy, RegistrationPolicy::OperatorOnly);
        assert_eq!(config.checkpoint_policy, CheckpointPolicy::Restricted);
    }

    #[test]
    fn zero_owner_is_invalid() {
        let text = "owner = \"0x0000000000000000000000000000000000000000\"";
        assert!(matches!(
            LedgerConfig::from_toml_str(text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = LedgerConfig::new(OWNER.parse().unwrap());
        config.journal_path = Some(PathBuf::from("/tmp/journal.jsonl"));
        let text = config.to_toml_string().unwrap();
        assert_eq!(LedgerConfig::from_toml_str(&text).unwrap(), config);
    }
}
