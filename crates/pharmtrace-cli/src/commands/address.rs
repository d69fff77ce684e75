//! Address command

use super::KeySource;
use anyhow::Result;

/// Print the identity a key signs as
pub fn run(source: &KeySource) -> Result<()> {
    let key = source.load()?;
    println!("{}", key.identity());
    Ok(())
}
