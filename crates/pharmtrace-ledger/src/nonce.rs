//! Replay-protection counters
//!
//! One counter per identity, starting at 0. A signed message bound to nonce
//! `n` is accepted only while the counter reads `n`; committing it moves the
//! counter to `n + 1`, so the same signed payload can never apply twice.
//!
//! Consumption is crate-private: the engine stages it together with the
//! write it authenticates.

use crate::facts::LedgerFact;
use pharmtrace_core::{Identity, LedgerError, LedgerResult};
use std::collections::HashMap;

/// Per-identity nonce counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonceTable {
    counters: HashMap<Identity, u64>,
}

impl NonceTable {
    /// Current nonce for `identity` (0 when unseen)
    pub fn current(&self, identity: Identity) -> u64 {
        self.counters.get(&identity).copied().unwrap_or(0)
    }

    /// Fail with `StaleNonce` unless the counter reads `expected`
    pub(crate) fn check(&self, identity: Identity, expected: u64) -> LedgerResult<()> {
        let current = self.current(identity);
        if current == expected {
            Ok(())
        } else {
            Err(LedgerError::StaleNonce {
                identity,
                expected,
                current,
            })
        }
    }

    /// Stage consumption of `expected`; the counter moves when the fact is applied
    pub(crate) fn consume(&self, identity: Identity, expected: u64) -> LedgerResult<LedgerFact> {
        self.check(identity, expected)?;
        Ok(LedgerFact::NonceConsumed {
            identity,
            consumed: expected,
        })
    }

    pub(crate) fn apply(&mut self, identity: Identity, consumed: u64) {
        let counter = self.counters.entry(identity).or_insert(0);
        *counter = (*counter).max(consumed.saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(n: u8) -> Identity {
        Identity::from_bytes([n; 20])
    }

    #[test]
    fn unseen_identity_starts_at_zero() {
        assert_eq!(NonceTable::default().current(id(1)), 0);
    }

    #[test]
    fn consume_requires_exact_match() {
        let mut table = NonceTable::default();
        assert!(matches!(
            table.consume(id(1), 1),
            Err(LedgerError::StaleNonce {
                expected: 1,
                current: 0,
                ..
            })
        ));

        let fact = table.consume(id(1), 0).unwrap();
        assert_eq!(
            fact,
            LedgerFact::NonceConsumed {
                identity: id(1),
                consumed: 0
            }
        );
        table.apply(id(1), 0);
        assert_eq!(table.current(id(1)), 1);
        assert!(table.consume(id(1), 0).is_err());
    }

    #[test]
    fn counters_are_independent_per_identity() {
        let mut table = NonceTable::default();
        table.apply(id(1), 0);
        table.apply(id(1), 1);
        assert_eq!(table.current(id(1)), 2);
        assert_eq!(table.current(id(2)), 0);
    }

    proptest! {
        #[test]
        fn counter_never_decreases_and_advances_by_one(attempts in proptest::collection::vec(0u64..6, 1..40)) {
            let mut table = NonceTable::default();
            let signer = id(7);
            for expected in attempts {
                let before = table.current(signer);
                match table.consume(signer, expected) {
                    Ok(LedgerFact::NonceConsumed { consumed, .. }) => {
                        table.apply(signer, consumed);
                        prop_assert_eq!(table.current(signer), before + 1);
                    }
                    Ok(other) => prop_assert!(false, "unexpected fact {:?}", other),
                    Err(_) => prop_assert_eq!(table.current(signer), before),
                }
            }
        }
    }
}
