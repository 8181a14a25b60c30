//! Deferred boolean conditions on encrypted values.
//!
//! Conditions are collected as 0/1 ciphertexts and only checked when a real
//! decryption is requested. Evaluation consumes the list: whatever the
//! outcome, nothing pending survives into the next decrypt.

use std::sync::Arc;

use ciphertext::{Ciphertext, CiphertextEngine, EngineResult};
use tracing::error;

#[derive(Debug, Clone, Default)]
pub struct OptimisticRequires {
    pending: Vec<Arc<Ciphertext>>,
}

impl OptimisticRequires {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Arc<Ciphertext>) {
        self.pending.push(condition);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Moves the pending conditions out, leaving this list empty.
    pub fn take(&mut self) -> PendingRequires {
        PendingRequires(std::mem::take(&mut self.pending))
    }

    pub fn evaluate(&mut self, engine: &dyn CiphertextEngine) -> EngineResult<bool> {
        self.take().evaluate(engine)
    }
}

/// Conditions detached from their context, dropped after evaluation.
#[derive(Debug)]
pub struct PendingRequires(Vec<Arc<Ciphertext>>);

impl PendingRequires {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// AND-reduces the conditions in order and decrypts the result once.
    /// An empty list is trivially true.
    pub fn evaluate(self, engine: &dyn CiphertextEngine) -> EngineResult<bool> {
        let mut conditions = self.0.into_iter();
        let Some(first) = conditions.next() else {
            return Ok(true);
        };
        let reduced = conditions
            .try_fold(None::<Ciphertext>, |cumulative, next| {
                let lhs = cumulative.as_ref().unwrap_or(first.as_ref());
                engine.bitand(lhs, &next).map(Some)
            })
            .map_err(|err| {
                error!(%err, "optimistic require bitand failed");
                err
            })?;
        let value = engine.decrypt(reduced.as_ref().unwrap_or(first.as_ref()))?;
        Ok(value != 0)
    }
}
