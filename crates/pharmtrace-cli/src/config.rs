//! CLI configuration file
//!
//! ```toml
//! operator_key = "operator.key"
//!
//! [ledger]
//! owner = "0x..."
//! journal_path = "journal.jsonl"
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use anyhow::{Context, Result};
use pharmtrace_ledger::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default operator key file name, written by `init`
pub const OPERATOR_KEY_FILE: &str = "operator.key";

/// Default journal file name, written by `init`
pub const JOURNAL_FILE: &str = "journal.jsonl";

/// On-disk CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Hex private key of the operator; direct writes are attributed to it
    pub operator_key: PathBuf,
    /// Ledger settings
    pub ledger: LedgerConfig,
}

impl CliConfig {
    /// Load and validate `path`; `None` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.ledger.validate()?;

        let base = base_dir(path);
        config.operator_key = resolve(&base, &config.operator_key);
        config.ledger.journal_path = config
            .ledger
            .journal_path
            .as_deref()
            .map(|journal| resolve(&base, journal));
        Ok(Some(config))
    }

    /// Write as TOML, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let text = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

/// Directory that relative paths in the config at `path` are resolved against
pub fn base_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmtrace_core::Identity;
    use pharmtrace_ledger::RegistrationPolicy;

    fn sample() -> CliConfig {
        let mut ledger = LedgerConfig::new(Identity::from_bytes([0x11; 20]));
        ledger.journal_path = Some(PathBuf::from(JOURNAL_FILE));
        ledger.registration_policy = RegistrationPolicy::OperatorOnly;
        CliConfig {
            operator_key: PathBuf::from(OPERATOR_KEY_FILE),
            ledger,
        }
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(&dir.path().join("absent.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn saved_config_loads_with_paths_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        sample().save(&path).unwrap();

        let loaded = CliConfig::load(&path).unwrap().unwrap();
        let base = dir.path().join("nested");
        assert_eq!(loaded.operator_key, base.join(OPERATOR_KEY_FILE));
        assert_eq!(loaded.ledger.journal_path, Some(base.join(JOURNAL_FILE)));
        assert_eq!(
            loaded.ledger.registration_policy,
            RegistrationPolicy::OperatorOnly
        );
        assert_eq!(loaded.ledger.owner, sample().ledger.owner);
    }

    #[test]
    fn zero_owner_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "operator_key = \"k\"\n\n[ledger]\nowner = \"0x0000000000000000000000000000000000000000\"\n",
        )
        .unwrap();
        assert!(CliConfig::load(&path).is_err());
    }
}
