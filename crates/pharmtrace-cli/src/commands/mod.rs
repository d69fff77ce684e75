//! CLI command implementations

pub mod address;
pub mod init;
pub mod serve;
pub mod sign;

use anyhow::{bail, Context, Result};
use clap::Args;
use pharmtrace_signature::ManufacturerKey;
use std::path::{Path, PathBuf};

/// Where to read a secp256k1 private key from
#[derive(Debug, Clone, Args)]
pub struct KeySource {
    /// Hex private key
    #[arg(long, conflicts_with = "key_file")]
    pub key: Option<String>,

    /// File holding a hex private key
    #[arg(long)]
    pub key_file: Option<PathBuf>,
}

impl KeySource {
    /// Load the key named by `--key` or `--key-file`
    pub fn load(&self) -> Result<ManufacturerKey> {
        match (&self.key, &self.key_file) {
            (Some(hex), _) => Ok(ManufacturerKey::from_hex(hex)?),
            (None, Some(path)) => read_key_file(path),
            (None, None) => bail!("either --key or --key-file is required"),
        }
    }
}

/// Read a hex private key from `path`
pub fn read_key_file(path: &Path) -> Result<ManufacturerKey> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    ManufacturerKey::from_hex(&text)
        .with_context(|| format!("Invalid key in {}", path.display()))
}
