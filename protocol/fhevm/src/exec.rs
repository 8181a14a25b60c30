//! Run functions for the dispatch table.

use ciphertext::{Ciphertext, FheUintType, Handle};
use tracing::{error, info};

use crate::abi::{encode_handle, encode_u64, low_u64, max_word};
use crate::environment::Environment;
use crate::error::{FhevmError, FhevmResult};
use crate::operands::{
    expect_len, parse_type, read_handle, resolve_binary, resolve_handle, BinaryOp,
    BinaryOperands,
};

fn logged<T>(method: &'static str, input: &[u8], result: FhevmResult<T>) -> FhevmResult<T> {
    result.map_err(|err| {
        error!(method, %err, input = %hex::encode(input), len = input.len(), "run failed");
        err
    })
}

/// Imports the produced ciphertext, or a placeholder of `fhe_type` while
/// estimating, and returns its handle.
fn import_result(
    env: &mut dyn Environment,
    fhe_type: FheUintType,
    produce: impl FnOnce(&dyn Environment) -> FhevmResult<Ciphertext>,
) -> FhevmResult<Handle> {
    let ciphertext = if env.mode().is_estimating() {
        Ciphertext::placeholder(fhe_type)
    } else {
        produce(&*env)?
    };
    Ok(env.import_ciphertext(ciphertext))
}

fn binary_run(env: &mut dyn Environment, op: BinaryOp, input: &[u8]) -> FhevmResult<Vec<u8>> {
    let method = op.method_name();
    logged(method, input, binary_op(env, op, input))
}

fn binary_op(env: &mut dyn Environment, op: BinaryOp, input: &[u8]) -> FhevmResult<Vec<u8>> {
    let method = op.method_name();
    let operands = resolve_binary(&*env, op, input)?;
    let fhe_type = operands.fhe_type();
    let result = import_result(env, fhe_type, |env| {
        let engine = env.engine();
        let out = match (&operands, op) {
            (BinaryOperands::Encrypted { lhs, rhs }, BinaryOp::Add) => engine.add(lhs, rhs),
            (BinaryOperands::Encrypted { lhs, rhs }, BinaryOp::Sub) => engine.sub(lhs, rhs),
            (BinaryOperands::Encrypted { lhs, rhs }, BinaryOp::BitAnd) => {
                engine.bitand(lhs, rhs)
            }
            (BinaryOperands::Scalar { lhs, rhs }, BinaryOp::Add) => {
                engine.scalar_add(lhs, *rhs)
            }
            (BinaryOperands::Scalar { lhs, rhs }, BinaryOp::Sub) => {
                engine.scalar_sub(lhs, *rhs)
            }
            (BinaryOperands::Scalar { .. }, BinaryOp::BitAnd) => {
                return Err(FhevmError::ScalarNotSupported(method))
            }
        };
        Ok(out?)
    })?;
    if env.mode().is_committing() {
        let lhs = read_handle(&input[..32]);
        match operands {
            BinaryOperands::Encrypted { .. } => {
                info!(method, %lhs, rhs = %read_handle(&input[32..64]), %result, "success")
            }
            BinaryOperands::Scalar { rhs, .. } => {
                info!(method, %lhs, scalar = rhs, %result, "success")
            }
        }
    }
    Ok(encode_handle(result))
}

pub fn fhe_add_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    binary_run(env, BinaryOp::Add, input)
}

pub fn fhe_sub_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    binary_run(env, BinaryOp::Sub, input)
}

pub fn fhe_bit_and_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    binary_run(env, BinaryOp::BitAnd, input)
}

pub fn cast_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    logged("cast", input, cast(env, input))
}

fn cast(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    expect_len("cast", input, 33)?;
    let source = resolve_handle(&*env, "cast", &input[..32])?;
    let to = parse_type("cast", input[32])?;
    let result = import_result(env, to, |env| Ok(env.engine().cast_to(&source, to)?))?;
    if env.mode().is_committing() {
        info!(method = "cast", source = %read_handle(&input[..32]), %to, %result, "success");
    }
    Ok(encode_handle(result))
}

pub fn trivial_encrypt_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    logged("trivialEncrypt", input, trivial_encrypt(env, input))
}

fn trivial_encrypt(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    expect_len("trivialEncrypt", input, 33)?;
    let to = parse_type("trivialEncrypt", input[32])?;
    let value = low_u64(&input[..32]);
    let result = import_result(env, to, |env| Ok(env.engine().trivial_encrypt(value, to)?))?;
    if env.mode().is_committing() {
        info!(method = "trivialEncrypt", value, %to, %result, "success");
    }
    Ok(encode_handle(result))
}

/// Drains the pending requires and checks they all hold. The list is empty
/// afterwards whatever the outcome.
pub fn evaluate_remaining_optimistic_requires(env: &mut dyn Environment) -> FhevmResult<()> {
    let pending = env.fhevm_data_mut().optimistic_requires.take();
    let count = pending.len();
    match pending.evaluate(env.engine()) {
        Ok(true) => Ok(()),
        Ok(false) => {
            error!(count, "optimistic require evaluated to false");
            Err(FhevmError::ExecutionReverted)
        }
        Err(err) => {
            error!(count, %err, "optimistic require evaluation failed");
            Err(FhevmError::RequireEvaluation(err))
        }
    }
}

pub fn decrypt_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    logged("decrypt", input, decrypt(env, input))
}

fn decrypt(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    expect_len("decrypt", input, 32)?;
    let ct = resolve_handle(&*env, "decrypt", input)?;
    // Output size is what matters to the host while estimating.
    if env.mode().is_estimating() {
        return Ok(max_word());
    }
    evaluate_remaining_optimistic_requires(env)?;
    let plaintext = env.engine().decrypt(&ct)?;
    if env.mode().is_committing() {
        info!(handle = %read_handle(input), "decrypt success");
    }
    Ok(encode_u64(plaintext))
}

/// Defers a condition to the next real decrypt. No cryptographic work, so
/// every mode behaves the same.
pub fn optimistic_require_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    logged("optimisticRequire", input, optimistic_require(env, input))
}

fn optimistic_require(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    expect_len("optimisticRequire", input, 32)?;
    let condition = resolve_handle(&*env, "optimisticRequire", input)?;
    env.fhevm_data_mut().optimistic_requires.push(condition);
    Ok(Vec::new())
}

pub fn pad_gas_run(_env: &mut dyn Environment, _input: &[u8]) -> FhevmResult<Vec<u8>> {
    Ok(Vec::new())
}
