//! Gas functions for the dispatch table.
//!
//! Every function here is pure over (payload, registry type tags, price
//! table). A payload that cannot be resolved costs 0, which the host reads
//! as "cannot proceed".

use tracing::error;

use crate::abi::low_u64;
use crate::environment::Environment;
use crate::error::FhevmResult;
use crate::operands::{expect_len, parse_type, resolve_binary, resolve_handle, BinaryOp};
use crate::params::TypePrices;

fn or_zero(method: &'static str, input: &[u8], priced: FhevmResult<u64>) -> u64 {
    priced.unwrap_or_else(|err| {
        error!(method, %err, input = %hex::encode(input), len = input.len(), "required gas failed");
        0
    })
}

fn binary_gas(env: &dyn Environment, op: BinaryOp, input: &[u8], prices: &TypePrices) -> u64 {
    let priced = resolve_binary(env, op, input).map(|ops| prices.get(ops.fhe_type()));
    or_zero(op.method_name(), input, priced)
}

pub fn fhe_add_required_gas(env: &dyn Environment, _supplied_gas: u64, input: &[u8]) -> u64 {
    binary_gas(env, BinaryOp::Add, input, &env.params().gas_costs.add_sub)
}

pub fn fhe_sub_required_gas(env: &dyn Environment, _supplied_gas: u64, input: &[u8]) -> u64 {
    binary_gas(env, BinaryOp::Sub, input, &env.params().gas_costs.add_sub)
}

pub fn fhe_bit_and_required_gas(env: &dyn Environment, _supplied_gas: u64, input: &[u8]) -> u64 {
    binary_gas(env, BinaryOp::BitAnd, input, &env.params().gas_costs.bitwise)
}

/// Flat cost; the handle and target type are only checked at run time.
pub fn cast_required_gas(env: &dyn Environment, _supplied_gas: u64, input: &[u8]) -> u64 {
    let priced = expect_len("cast", input, 33).map(|()| env.params().gas_costs.cast);
    or_zero("cast", input, priced)
}

pub fn decrypt_required_gas(env: &dyn Environment, _supplied_gas: u64, input: &[u8]) -> u64 {
    let priced = expect_len("decrypt", input, 32)
        .and_then(|()| resolve_handle(env, "decrypt", input))
        .map(|ct| env.params().gas_costs.decrypt.get(ct.fhe_type()));
    or_zero("decrypt", input, priced)
}

pub fn trivial_encrypt_required_gas(env: &dyn Environment, _supplied_gas: u64, input: &[u8]) -> u64 {
    let priced = expect_len("trivialEncrypt", input, 33)
        .and_then(|()| parse_type("trivialEncrypt", input[32]))
        .map(|ty| env.params().gas_costs.trivial_encrypt.get(ty));
    or_zero("trivialEncrypt", input, priced)
}

pub fn optimistic_require_required_gas(
    env: &dyn Environment,
    _supplied_gas: u64,
    input: &[u8],
) -> u64 {
    let priced = expect_len("optimisticRequire", input, 32)
        .and_then(|()| resolve_handle(env, "optimisticRequire", input))
        .map(|ct| env.params().gas_costs.optimistic_require.get(ct.fhe_type()));
    or_zero("optimisticRequire", input, priced)
}

/// Tops the call up to `target` gas measured from the start of the
/// transaction, so both sides of a branch can be made to cost the same.
pub fn pad_gas_required_gas(env: &dyn Environment, supplied_gas: u64, input: &[u8]) -> u64 {
    let target = low_u64(input);
    let consumed = env.gas_limit().saturating_sub(supplied_gas);
    target.saturating_sub(consumed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ciphertext::{CiphertextEngine, ClearEngine, FheUintType};

    use super::*;
    use crate::abi::word_from_u64;
    use crate::environment::{ExecutionContext, ExecutionMode};
    use crate::params::FhevmParams;

    fn context() -> ExecutionContext<ClearEngine> {
        ExecutionContext::new(
            ClearEngine::new(),
            Arc::new(FhevmParams::default()),
            ExecutionMode::Estimating,
        )
    }

    #[test]
    fn pad_gas_tops_up_to_target() {
        let ctx = context().with_gas_limit(100);
        for (supplied, target, expected) in [(40, 20, 0), (90, 110, 100), (10, 90, 0), (50, 90, 40)]
        {
            let input = word_from_u64(target);
            assert_eq!(pad_gas_required_gas(&ctx, supplied, &input), expected);
        }
    }

    #[test]
    fn cast_checks_only_length() {
        let ctx = context();
        let mut input = [0u8; 33];
        input[32] = 0x7F;
        assert_eq!(cast_required_gas(&ctx, 0, &input), 200);
        assert_eq!(cast_required_gas(&ctx, 0, &input[..32]), 0);
    }

    #[test]
    fn trivial_encrypt_is_priced_by_target_type() {
        let ctx = context();
        let mut input = [0u8; 33];
        input[32] = FheUintType::FheUint32.as_byte();
        assert_eq!(trivial_encrypt_required_gas(&ctx, 0, &input), 300);
        input[32] = 9;
        assert_eq!(trivial_encrypt_required_gas(&ctx, 0, &input), 0);
    }

    #[test]
    fn decrypt_needs_a_verified_handle() {
        let mut ctx = context();
        assert_eq!(decrypt_required_gas(&ctx, 0, &[1u8; 32]), 0);
        let ct = ClearEngine::new()
            .trivial_encrypt(3, FheUintType::FheUint16)
            .unwrap();
        let handle = ctx.import_ciphertext(ct);
        assert_eq!(decrypt_required_gas(&ctx, 0, &handle.0), 500_000);
        assert_eq!(
            optimistic_require_required_gas(&ctx, 0, &handle.0),
            180_000
        );
    }
}
