use std::sync::Arc;

use ciphertext::{Ciphertext, FheUintType, Handle};

use crate::abi::low_u64;
use crate::environment::Environment;
use crate::error::{FhevmError, FhevmResult};

/// Handle, scalar word and flag byte.
pub const BINARY_PAYLOAD_LEN: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    BitAnd,
}

impl BinaryOp {
    pub fn method_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "fheAdd",
            BinaryOp::Sub => "fheSub",
            BinaryOp::BitAnd => "fheBitAnd",
        }
    }

    pub fn supports_scalar(self) -> bool {
        !matches!(self, BinaryOp::BitAnd)
    }
}

#[derive(Debug, Clone)]
pub enum BinaryOperands {
    Encrypted {
        lhs: Arc<Ciphertext>,
        rhs: Arc<Ciphertext>,
    },
    Scalar {
        lhs: Arc<Ciphertext>,
        rhs: u64,
    },
}

impl BinaryOperands {
    pub fn lhs(&self) -> &Arc<Ciphertext> {
        match self {
            BinaryOperands::Encrypted { lhs, .. } | BinaryOperands::Scalar { lhs, .. } => lhs,
        }
    }

    /// Result type of the operation; always the left operand's.
    pub fn fhe_type(&self) -> FheUintType {
        self.lhs().fhe_type()
    }
}

pub fn expect_len(method: &'static str, input: &[u8], expected: usize) -> FhevmResult<()> {
    if input.len() != expected {
        return Err(FhevmError::InvalidLength {
            method,
            len: input.len(),
            expected,
        });
    }
    Ok(())
}

/// Reads the trailing flag byte. `0x01` selects the scalar form.
pub fn is_scalar_op(method: &'static str, input: &[u8]) -> FhevmResult<bool> {
    expect_len(method, input, BINARY_PAYLOAD_LEN)?;
    Ok(input[64] == 1)
}

pub fn parse_type(method: &'static str, byte: u8) -> FhevmResult<FheUintType> {
    FheUintType::from_byte(byte).ok_or(FhevmError::InvalidType { method, byte })
}

pub fn read_handle(bytes: &[u8]) -> Handle {
    let mut out = [0u8; 32];
    let n = bytes.len().min(32);
    out[32 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    Handle(out)
}

pub fn resolve_handle(
    env: &dyn Environment,
    method: &'static str,
    bytes: &[u8],
) -> FhevmResult<Arc<Ciphertext>> {
    let handle = read_handle(bytes);
    env.verified_ciphertext(&handle)
        .ok_or(FhevmError::UnverifiedCiphertext { method, handle })
}

/// Resolves a 65-byte binary payload into typed operands.
pub fn resolve_binary(
    env: &dyn Environment,
    op: BinaryOp,
    input: &[u8],
) -> FhevmResult<BinaryOperands> {
    let method = op.method_name();
    if is_scalar_op(method, input)? {
        if !op.supports_scalar() {
            return Err(FhevmError::ScalarNotSupported(method));
        }
        let lhs = resolve_handle(env, method, &input[0..32])?;
        let rhs = low_u64(&input[32..64]);
        return Ok(BinaryOperands::Scalar { lhs, rhs });
    }
    let lhs = resolve_handle(env, method, &input[0..32])?;
    let rhs = resolve_handle(env, method, &input[32..64])?;
    if lhs.fhe_type() != rhs.fhe_type() {
        return Err(FhevmError::TypeMismatch {
            method,
            lhs: lhs.fhe_type(),
            rhs: rhs.fhe_type(),
        });
    }
    Ok(BinaryOperands::Encrypted { lhs, rhs })
}
