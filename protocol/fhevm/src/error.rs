use ciphertext::{EngineError, FheUintType, Handle};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FhevmError {
    #[error("input must contain at least 4 bytes for method signature, got {0}")]
    MissingSelector(usize),
    #[error("precompile method not found: {0:#010x}")]
    UnknownSelector(u32),
    #[error("{method}: input length {len}, expected {expected}")]
    InvalidLength {
        method: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("{method}: invalid ciphertext type byte {byte:#04x}")]
    InvalidType { method: &'static str, byte: u8 },
    #[error("{method}: unverified ciphertext handle {handle}")]
    UnverifiedCiphertext {
        method: &'static str,
        handle: Handle,
    },
    #[error("{method}: operand type mismatch, lhs {lhs} rhs {rhs}")]
    TypeMismatch {
        method: &'static str,
        lhs: FheUintType,
        rhs: FheUintType,
    },
    #[error("{0}: scalar operand not supported")]
    ScalarNotSupported(&'static str),
    #[error("execution reverted")]
    ExecutionReverted,
    #[error("execution reverted: optimistic require evaluation failed: {0}")]
    RequireEvaluation(#[source] EngineError),
    #[error("public key hash does not match stored value")]
    PublicKeyMismatch,
    #[error("public key not configured")]
    PublicKeyMissing,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl FhevmError {
    /// Reverts are legitimate program outcomes rather than protocol violations.
    pub fn is_revert(&self) -> bool {
        matches!(
            self,
            FhevmError::ExecutionReverted | FhevmError::RequireEvaluation(_)
        )
    }
}

pub type FhevmResult<T> = Result<T, FhevmError>;
