//! Reference engine that carries plaintexts in the clear.
//!
//! Payloads are the bincode encoding of the value, so ciphertexts of equal
//! type and value share a handle. Useful for tests and dev tooling; it offers
//! no confidentiality.

use serde::{Deserialize, Serialize};

use crate::{Ciphertext, CiphertextEngine, EngineError, EngineResult, FheUintType};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClearPayload {
    value: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClearEngine;

impl ClearEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, value: u64, fhe_type: FheUintType) -> EngineResult<Ciphertext> {
        let payload = ClearPayload {
            value: fhe_type.wrap(value),
        };
        let bytes = bincode::serialize(&payload)
            .map_err(|e| EngineError::Other(format!("bincode: {e}")))?;
        Ok(Ciphertext::new(fhe_type, bytes))
    }

    fn value_of(&self, ct: &Ciphertext) -> EngineResult<u64> {
        let payload: ClearPayload = bincode::deserialize(ct.payload())
            .map_err(|e| EngineError::Malformed(e.to_string()))?;
        Ok(ct.fhe_type().wrap(payload.value))
    }

    fn binary(
        &self,
        lhs: &Ciphertext,
        rhs: &Ciphertext,
        f: impl FnOnce(u64, u64) -> u64,
    ) -> EngineResult<Ciphertext> {
        if lhs.fhe_type() != rhs.fhe_type() {
            return Err(EngineError::TypeMismatch {
                lhs: lhs.fhe_type(),
                rhs: rhs.fhe_type(),
            });
        }
        let a = self.value_of(lhs)?;
        let b = self.value_of(rhs)?;
        self.encode(f(a, b), lhs.fhe_type())
    }

    fn scalar(
        &self,
        lhs: &Ciphertext,
        rhs: u64,
        f: impl FnOnce(u64, u64) -> u64,
    ) -> EngineResult<Ciphertext> {
        let a = self.value_of(lhs)?;
        let b = lhs.fhe_type().wrap(rhs);
        self.encode(f(a, b), lhs.fhe_type())
    }
}

impl CiphertextEngine for ClearEngine {
    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext> {
        self.binary(lhs, rhs, u64::wrapping_add)
    }

    fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext> {
        self.binary(lhs, rhs, u64::wrapping_sub)
    }

    fn scalar_add(&self, lhs: &Ciphertext, rhs: u64) -> EngineResult<Ciphertext> {
        self.scalar(lhs, rhs, u64::wrapping_add)
    }

    fn scalar_sub(&self, lhs: &Ciphertext, rhs: u64) -> EngineResult<Ciphertext> {
        self.scalar(lhs, rhs, u64::wrapping_sub)
    }

    fn bitand(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext> {
        self.binary(lhs, rhs, |a, b| a & b)
    }

    fn cast_to(&self, ct: &Ciphertext, to: FheUintType) -> EngineResult<Ciphertext> {
        let value = self.value_of(ct)?;
        self.encode(value, to)
    }

    fn trivial_encrypt(&self, value: u64, fhe_type: FheUintType) -> EngineResult<Ciphertext> {
        self.encode(value, fhe_type)
    }

    fn decrypt(&self, ct: &Ciphertext) -> EngineResult<u64> {
        self.value_of(ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_wraps_at_type_width() {
        let engine = ClearEngine::new();
        let a = engine.trivial_encrypt(250, FheUintType::FheUint8).unwrap();
        let b = engine.trivial_encrypt(10, FheUintType::FheUint8).unwrap();
        let sum = engine.add(&a, &b).unwrap();
        assert_eq!(engine.decrypt(&sum).unwrap(), 4);

        let diff = engine.scalar_sub(&b, 11).unwrap();
        assert_eq!(engine.decrypt(&diff).unwrap(), 255);

        let nibble = engine.scalar_add(&engine.trivial_encrypt(15, FheUintType::FheUint4).unwrap(), 1).unwrap();
        assert_eq!(engine.decrypt(&nibble).unwrap(), 0);
    }

    #[test]
    fn mismatched_types_are_rejected() {
        let engine = ClearEngine::new();
        let a = engine.trivial_encrypt(1, FheUintType::FheUint8).unwrap();
        let b = engine.trivial_encrypt(1, FheUintType::FheUint16).unwrap();
        assert!(matches!(
            engine.bitand(&a, &b),
            Err(EngineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn cast_truncates_and_extends() {
        let engine = ClearEngine::new();
        let wide = engine.trivial_encrypt(0x1234, FheUintType::FheUint16).unwrap();
        let narrow = engine.cast_to(&wide, FheUintType::FheUint8).unwrap();
        assert_eq!(narrow.fhe_type(), FheUintType::FheUint8);
        assert_eq!(engine.decrypt(&narrow).unwrap(), 0x34);
        let back = engine.cast_to(&narrow, FheUintType::FheUint64).unwrap();
        assert_eq!(engine.decrypt(&back).unwrap(), 0x34);
    }

    #[test]
    fn equal_values_share_a_handle() {
        let engine = ClearEngine::new();
        let a = engine.trivial_encrypt(7, FheUintType::FheUint32).unwrap();
        let b = engine.trivial_encrypt(7, FheUintType::FheUint32).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let engine = ClearEngine::new();
        let ct = Ciphertext::new(FheUintType::FheUint8, vec![1, 2]);
        assert!(matches!(engine.decrypt(&ct), Err(EngineError::Malformed(_))));
    }
}
