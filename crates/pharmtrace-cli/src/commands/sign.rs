//! Sign command
//!
//! Produces a `registerWithSig` request on stdout, ready to pipe into
//! `pharmtrace serve` or hand to any relayer.

use super::KeySource;
use anyhow::{Context, Result};
use clap::Args;
use pharmtrace_core::{registration_digest, DrugFields};
use pharmtrace_service::LedgerRequest;
use pharmtrace_signature::ManufacturerKey;
use rand::Rng;
use tracing::info;

/// Arguments for `pharmtrace sign`
#[derive(Debug, Clone, Args)]
pub struct SignArgs {
    #[command(flatten)]
    key: KeySource,

    /// Batch identifier; a random `DRUG-<n>` when omitted
    #[arg(long)]
    drug_id: Option<String>,

    /// Commercial drug name
    #[arg(long, default_value = "Amoxicillin")]
    drug_name: String,

    /// Active ingredients
    #[arg(long, default_value = "Amoxicillin")]
    composition: String,

    /// Dosage
    #[arg(long, default_value = "250mg")]
    dosage: String,

    /// Manufacturer batch number
    #[arg(long, default_value = "B-002")]
    batch_no: String,

    /// Expiry date
    #[arg(long, default_value = "2027-01-01")]
    expiry_date: String,

    /// Signer's current nonce, as returned by the `nonce` request
    #[arg(long, default_value_t = 0)]
    nonce: u64,
}

/// Sign and print the request
pub fn run(args: SignArgs) -> Result<()> {
    let key = args.key.load()?;
    let request = build_request(&key, args)?;
    println!("{}", serde_json::to_string(&request)?);
    Ok(())
}

fn build_request(key: &ManufacturerKey, args: SignArgs) -> Result<LedgerRequest> {
    let drug_id = args
        .drug_id
        .unwrap_or_else(|| format!("DRUG-{}", rand::thread_rng().gen_range(0..100_000)));
    let drug = DrugFields::new(
        drug_id,
        args.drug_name,
        args.composition,
        args.dosage,
        args.batch_no,
        args.expiry_date,
    );

    let digest = registration_digest(&drug, args.nonce);
    let signature = key
        .sign_digest(&digest)
        .context("Failed to sign registration")?;
    info!(
        signer = %key.identity(),
        drug_id = %drug.drug_id,
        nonce = args.nonce,
        digest = %hex::encode(digest),
        "Signed registration"
    );

    Ok(LedgerRequest::RegisterWithSig {
        drug,
        signer: key.identity().to_string(),
        signature: signature.to_hex(),
        nonce: Some(args.nonce),
    })
}
