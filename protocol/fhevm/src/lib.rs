//! Dispatch, metering and bookkeeping for the confidential arithmetic
//! precompiles.
//!
//! A host calls [`required_gas`] before [`run`] with the same raw input
//! (`[4-byte selector][payload]`) and an [`Environment`] that lives for the
//! duration of the top-level call.

pub mod abi;
pub mod environment;
pub mod error;
pub mod exec;
pub mod gas;
pub mod methods;
pub mod operands;
pub mod params;
pub mod pubkey;
pub mod registry;
pub mod require;

use tracing::error;

pub use ciphertext::{Ciphertext, CiphertextEngine, ClearEngine, FheUintType, Handle};
pub use environment::{Environment, ExecutionContext, ExecutionMode, FhevmData};
pub use error::{FhevmError, FhevmResult};
pub use exec::evaluate_remaining_optimistic_requires;
pub use methods::{lookup, method_table, methods, selector_of, Method};
pub use params::{FhevmParams, GasCosts, TypePrices};
pub use pubkey::PublicKey;
pub use registry::Registry;
pub use require::OptimisticRequires;

/// 32-byte keccak digest.
pub type Hash = [u8; 32];

fn dispatch(input: &[u8]) -> FhevmResult<&'static Method> {
    let Some(head) = input.get(..4) else {
        return Err(FhevmError::MissingSelector(input.len()));
    };
    let selector = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
    lookup(selector).ok_or(FhevmError::UnknownSelector(selector))
}

/// Gas for `input`. Zero means the call cannot proceed.
pub fn required_gas(env: &dyn Environment, supplied_gas: u64, input: &[u8]) -> u64 {
    match dispatch(input) {
        Ok(method) => (method.required_gas)(env, supplied_gas, method.payload(input)),
        Err(err) => {
            error!(%err, input = %hex::encode(input), "required gas dispatch failed");
            0
        }
    }
}

pub fn run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    let method = dispatch(input).map_err(|err| {
        error!(%err, input = %hex::encode(input), "run dispatch failed");
        err
    })?;
    (method.run)(env, method.payload(input))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn context() -> ExecutionContext<ClearEngine> {
        ExecutionContext::new(
            ClearEngine::new(),
            Arc::new(FhevmParams::default()),
            ExecutionMode::Committing,
        )
    }

    #[test]
    fn short_input_is_rejected() {
        let mut ctx = context();
        assert_eq!(required_gas(&ctx, 0, &[1, 2, 3]), 0);
        assert_eq!(
            run(&mut ctx, &[1, 2, 3]).unwrap_err(),
            FhevmError::MissingSelector(3)
        );
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let mut ctx = context();
        let input = [0xde, 0xad, 0xbe, 0xef, 0, 0];
        assert_eq!(required_gas(&ctx, 0, &input), 0);
        assert_eq!(
            run(&mut ctx, &input).unwrap_err(),
            FhevmError::UnknownSelector(0xdeadbeef)
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut ctx = context();
        let mut input = abi::typed_call(
            "trivialEncrypt(uint256,bytes1)",
            &abi::word_from_u64(5),
            FheUintType::FheUint8,
        );
        input.extend_from_slice(&[0xAA; 7]);
        assert_eq!(required_gas(&ctx, 0, &input), 100);
        let handle = run(&mut ctx, &input).unwrap();
        let out = run(&mut ctx, &abi::encode_call("decrypt(uint256)", &[&handle])).unwrap();
        assert_eq!(out, abi::encode_u64(5));
    }
}
