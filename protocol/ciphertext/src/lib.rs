use revm::primitives::keccak256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

pub mod clear;

pub use clear::ClearEngine;

/// Encrypted integer widths understood by the precompiles. The discriminant is
/// the type byte used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FheUintType {
    FheUint4 = 0,
    FheUint8 = 1,
    FheUint16 = 2,
    FheUint32 = 3,
    FheUint64 = 4,
}

impl FheUintType {
    pub const ALL: [FheUintType; 5] = [
        FheUintType::FheUint4,
        FheUintType::FheUint8,
        FheUintType::FheUint16,
        FheUintType::FheUint32,
        FheUintType::FheUint64,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(FheUintType::FheUint4),
            1 => Some(FheUintType::FheUint8),
            2 => Some(FheUintType::FheUint16),
            3 => Some(FheUintType::FheUint32),
            4 => Some(FheUintType::FheUint64),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn bits(self) -> u32 {
        match self {
            FheUintType::FheUint4 => 4,
            FheUintType::FheUint8 => 8,
            FheUintType::FheUint16 => 16,
            FheUintType::FheUint32 => 32,
            FheUintType::FheUint64 => 64,
        }
    }

    /// Largest plaintext representable at this width.
    pub fn max_value(self) -> u64 {
        match self.bits() {
            64 => u64::MAX,
            bits => (1u64 << bits) - 1,
        }
    }

    /// Reduces `value` modulo 2^bits.
    pub fn wrap(self, value: u64) -> u64 {
        value & self.max_value()
    }
}

impl TryFrom<u8> for FheUintType {
    type Error = EngineError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(EngineError::InvalidType(byte))
    }
}

impl fmt::Display for FheUintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "euint{}", self.bits())
    }
}

/// Content-derived identifier of a ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Handle(pub [u8; 32]);

impl Handle {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Handle)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.to_hex())
    }
}

/// Opaque encrypted value tagged with its integer width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    fhe_type: FheUintType,
    payload: Vec<u8>,
}

impl Ciphertext {
    pub fn new(fhe_type: FheUintType, payload: Vec<u8>) -> Self {
        Self { fhe_type, payload }
    }

    /// A ciphertext of the requested type whose content carries no meaning.
    /// Gas estimation imports these instead of running real homomorphic work.
    pub fn placeholder(fhe_type: FheUintType) -> Self {
        let payload: [u8; 32] = rand::random();
        Self::new(fhe_type, payload.to_vec())
    }

    pub fn fhe_type(&self) -> FheUintType {
        self.fhe_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Canonical serialized form: type byte followed by the engine payload.
    pub fn serialized(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.payload.len());
        out.push(self.fhe_type.as_byte());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn content_hash(&self) -> Handle {
        Handle(keccak256(self.serialized()).0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("operand type mismatch: {lhs} vs {rhs}")]
    TypeMismatch { lhs: FheUintType, rhs: FheUintType },
    #[error("{op} is not supported for {fhe_type}")]
    Unsupported {
        op: &'static str,
        fhe_type: FheUintType,
    },
    #[error("invalid ciphertext type byte {0:#04x}")]
    InvalidType(u8),
    #[error("malformed ciphertext payload: {0}")]
    Malformed(String),
    #[error("engine failure: {0}")]
    Other(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Homomorphic backend the precompiles delegate to. Every call is synchronous.
pub trait CiphertextEngine {
    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext>;
    fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext>;
    fn scalar_add(&self, lhs: &Ciphertext, rhs: u64) -> EngineResult<Ciphertext>;
    fn scalar_sub(&self, lhs: &Ciphertext, rhs: u64) -> EngineResult<Ciphertext>;
    fn bitand(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext>;
    fn cast_to(&self, ct: &Ciphertext, to: FheUintType) -> EngineResult<Ciphertext>;
    fn trivial_encrypt(&self, value: u64, fhe_type: FheUintType) -> EngineResult<Ciphertext>;
    fn decrypt(&self, ct: &Ciphertext) -> EngineResult<u64>;
}

macro_rules! forward_engine {
    ($ptr:ident) => {
        impl<T: CiphertextEngine + ?Sized> CiphertextEngine for $ptr<T> {
            fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext> {
                (**self).add(lhs, rhs)
            }
            fn sub(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext> {
                (**self).sub(lhs, rhs)
            }
            fn scalar_add(&self, lhs: &Ciphertext, rhs: u64) -> EngineResult<Ciphertext> {
                (**self).scalar_add(lhs, rhs)
            }
            fn scalar_sub(&self, lhs: &Ciphertext, rhs: u64) -> EngineResult<Ciphertext> {
                (**self).scalar_sub(lhs, rhs)
            }
            fn bitand(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> EngineResult<Ciphertext> {
                (**self).bitand(lhs, rhs)
            }
            fn cast_to(&self, ct: &Ciphertext, to: FheUintType) -> EngineResult<Ciphertext> {
                (**self).cast_to(ct, to)
            }
            fn trivial_encrypt(&self, value: u64, fhe_type: FheUintType) -> EngineResult<Ciphertext> {
                (**self).trivial_encrypt(value, fhe_type)
            }
            fn decrypt(&self, ct: &Ciphertext) -> EngineResult<u64> {
                (**self).decrypt(ct)
            }
        }
    };
}

forward_engine!(Arc);
forward_engine!(Rc);
forward_engine!(Box);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_bytes_round_trip_and_reject_unknown() {
        for ty in FheUintType::ALL {
            assert_eq!(FheUintType::from_byte(ty.as_byte()), Some(ty));
        }
        assert_eq!(FheUintType::from_byte(5), None);
        assert_eq!(FheUintType::try_from(0xff), Err(EngineError::InvalidType(0xff)));
    }

    #[test]
    fn max_value_matches_width() {
        assert_eq!(FheUintType::FheUint4.max_value(), 15);
        assert_eq!(FheUintType::FheUint8.max_value(), 255);
        assert_eq!(FheUintType::FheUint64.max_value(), u64::MAX);
        assert_eq!(FheUintType::FheUint16.wrap(0x1_0001), 1);
    }

    #[test]
    fn content_hash_depends_on_type_and_payload() {
        let a = Ciphertext::new(FheUintType::FheUint8, vec![1, 2, 3]);
        let b = Ciphertext::new(FheUintType::FheUint16, vec![1, 2, 3]);
        let c = Ciphertext::new(FheUintType::FheUint8, vec![1, 2, 3]);
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn placeholders_keep_requested_type() {
        let p = Ciphertext::placeholder(FheUintType::FheUint32);
        assert_eq!(p.fhe_type(), FheUintType::FheUint32);
        assert_eq!(p.payload().len(), 32);
    }
}
