//! Request dispatch
//!
//! Parses identities and signatures out of request text, applies the
//! defaults (operator as caller, current nonce for unsigned-nonce payloads)
//! and forwards to the engine. The engine never sees request strings.

use crate::request::{LedgerRequest, TimestampValue};
use crate::response::{BatchView, LedgerResponse};
use pharmtrace_core::{DrugFields, Identity, LedgerError, LedgerResult, SignatureError};
use pharmtrace_ledger::{SignedRegistration, TransitionEngine};
use std::sync::Arc;
use tracing::debug;

/// Maps [`LedgerRequest`]s onto a shared [`TransitionEngine`]
#[derive(Debug, Clone)]
pub struct LedgerService {
    engine: Arc<TransitionEngine>,
    operator: Identity,
}

impl LedgerService {
    /// Service whose direct writes are attributed to `operator` unless a request names `from`
    pub fn new(engine: Arc<TransitionEngine>, operator: Identity) -> Self {
        Self { engine, operator }
    }

    /// Underlying engine
    pub fn engine(&self) -> &Arc<TransitionEngine> {
        &self.engine
    }

    /// Default caller for direct writes
    pub fn operator(&self) -> Identity {
        self.operator
    }

    /// Parse one JSON request and handle it
    pub fn handle_json(&self, line: &str) -> LedgerResponse {
        match serde_json::from_str::<LedgerRequest>(line) {
            Ok(request) => self.handle(request),
            Err(err) => {
                debug!(error = %err, "Unparseable request");
                LedgerResponse::invalid_request(err.to_string())
            }
        }
    }

    /// Handle one request; failures become `{ok: false}` responses
    pub fn handle(&self, request: LedgerRequest) -> LedgerResponse {
        let op = request.op();
        debug!(op, "Handling request");
        match self.dispatch(request) {
            Ok(response) => response,
            Err(err) => {
                debug!(op, kind = err.code(), "Request rejected");
                LedgerResponse::from(&err)
            }
        }
    }

    fn dispatch(&self, request: LedgerRequest) -> LedgerResult<LedgerResponse> {
        match request {
            LedgerRequest::Register { drug, from } => {
                require_registration_fields(&drug)?;
                let caller = self.caller(from.as_deref())?;
                let drug_id = drug.drug_id.clone();
                self.engine.register(caller, drug)?;
                Ok(LedgerResponse::message(format!("Drug {drug_id} registered")))
            }

            LedgerRequest::RegisterWithSig {
                drug,
                signer,
                signature,
                nonce,
            } => {
                require(&drug.drug_id, "drugId")?;
                let signer = parse_identity(&signer, "signer")?;
                let signature = decode_signature(require(&signature, "signature")?)?;
                let nonce = nonce.unwrap_or_else(|| self.engine.current_nonce(signer));
                let drug_id = drug.drug_id.clone();
                self.engine.register_with_signature(SignedRegistration {
                    signer,
                    drug,
                    nonce,
                    signature,
                })?;
                Ok(LedgerResponse::message(format!(
                    "Drug {drug_id} registered by {signer}"
                )))
            }

            LedgerRequest::UpdateLocation {
                drug_id,
                location,
                timestamp,
                from,
            } => {
                require(&drug_id, "drugId")?;
                require(&location, "location")?;
                let timestamp = timestamp
                    .as_ref()
                    .map(TimestampValue::to_string)
                    .filter(|text| !text.trim().is_empty())
                    .ok_or_else(|| LedgerError::missing_field("timestamp"))?;
                let caller = self.caller(from.as_deref())?;
                self.engine
                    .update_location(caller, &drug_id, location, timestamp)?;
                Ok(LedgerResponse::message(format!(
                    "Drug {drug_id} location updated"
                )))
            }

            LedgerRequest::Nonce { address } => {
                let address = parse_identity(&address, "address")?;
                Ok(LedgerResponse::Nonce {
                    ok: true,
                    nonce: self.engine.current_nonce(address),
                })
            }

            LedgerRequest::Verify { drug_id } => {
                require(&drug_id, "drugId")?;
                let provenance = self.engine.provenance(&drug_id)?;
                Ok(LedgerResponse::Batch(Box::new(BatchView::from(provenance))))
            }

            LedgerRequest::AuthorizeManufacturer { address, from } => {
                let target = parse_identity(&address, "address")?;
                let admin = self.caller(from.as_deref())?;
                self.engine.authorize(admin, target)?;
                Ok(LedgerResponse::message(format!("Authorized {target}")))
            }

            LedgerRequest::RevokeManufacturer { address, from } => {
                let target = parse_identity(&address, "address")?;
                let admin = self.caller(from.as_deref())?;
                self.engine.revoke(admin, target)?;
                Ok(LedgerResponse::message(format!("Revoked {target}")))
            }

            LedgerRequest::Status { address } => {
                let address = parse_identity(&address, "address")?;
                Ok(LedgerResponse::Status {
                    ok: true,
                    address,
                    status: self.engine.manufacturer_status(address),
                })
            }
        }
    }

    fn caller(&self, from: Option<&str>) -> LedgerResult<Identity> {
        match from {
            Some(text) if !text.trim().is_empty() => text.trim().parse(),
            _ => Ok(self.operator),
        }
    }
}

/// Direct registration also needs the batch number and expiry
fn require_registration_fields(drug: &DrugFields) -> LedgerResult<()> {
    require(&drug.drug_id, "drugId")?;
    require(&drug.batch_no, "batchNo")?;
    require(&drug.expiry_date, "expiryDate")?;
    Ok(())
}

fn require<'a>(value: &'a str, field: &str) -> LedgerResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(LedgerError::missing_field(field))
    } else {
        Ok(trimmed)
    }
}

fn parse_identity(value: &str, field: &str) -> LedgerResult<Identity> {
    require(value, field)?.parse()
}

fn decode_signature(text: &str) -> LedgerResult<Vec<u8>> {
    let hex_part = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(hex_part)
        .map_err(|err| SignatureError::malformed(format!("signature is not hex: {err}")).into())
}
