//! Init command
//!
//! Writes a fresh operator key and a config naming it as ledger owner, with a
//! file journal beside the config.

use crate::config::{base_dir, CliConfig, JOURNAL_FILE, OPERATOR_KEY_FILE};
use anyhow::{bail, Context, Result};
use pharmtrace_ledger::LedgerConfig;
use pharmtrace_signature::ManufacturerKey;
use std::path::{Path, PathBuf};
use tracing::info;

/// Initialize a ledger directory around `config_path`
pub fn run(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            config_path.display()
        );
    }

    let key = ManufacturerKey::generate();
    let dir = base_dir(config_path);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let key_path = dir.join(OPERATOR_KEY_FILE);
    std::fs::write(&key_path, format!("{}\n", key.to_hex()))
        .with_context(|| format!("Failed to write key file {}", key_path.display()))?;
    restrict_permissions(&key_path)?;

    let mut ledger = LedgerConfig::new(key.identity());
    ledger.journal_path = Some(PathBuf::from(JOURNAL_FILE));
    let config = CliConfig {
        operator_key: PathBuf::from(OPERATOR_KEY_FILE),
        ledger,
    };
    config.save(config_path)?;

    info!(
        config = %config_path.display(),
        operator = %key.identity(),
        "Ledger initialized"
    );
    println!("{}", key.identity());
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
