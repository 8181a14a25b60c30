use std::collections::HashMap;
use std::sync::OnceLock;

use revm::primitives::keccak256;

use crate::environment::Environment;
use crate::error::FhevmResult;
use crate::{exec, gas, pubkey};

pub type RequiredGasFn = fn(&dyn Environment, u64, &[u8]) -> u64;
pub type RunFn = fn(&mut dyn Environment, &[u8]) -> FhevmResult<Vec<u8>>;

/// One entry of the precompile dispatch table.
pub struct Method {
    pub name: &'static str,
    pub arg_types: &'static str,
    /// Payload bytes after the selector; anything beyond is ignored.
    pub payload_len: usize,
    pub required_gas: RequiredGasFn,
    pub run: RunFn,
}

impl Method {
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.arg_types)
    }

    pub fn selector(&self) -> u32 {
        selector_of(&self.signature())
    }

    /// Payload following the selector, truncated to the declared shape.
    pub fn payload<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let end = input.len().min(4 + self.payload_len);
        input.get(4..end).unwrap_or(&[])
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("signature", &self.signature())
            .field("selector", &format_args!("{:#010x}", self.selector()))
            .finish()
    }
}

/// First four bytes of keccak-256 over the canonical signature.
pub fn selector_of(signature: &str) -> u32 {
    let digest = keccak256(signature.as_bytes()).0;
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

static METHODS: [Method; 9] = [
    Method {
        name: "fheAdd",
        arg_types: "(uint256,uint256,bytes1)",
        payload_len: 65,
        required_gas: gas::fhe_add_required_gas,
        run: exec::fhe_add_run,
    },
    Method {
        name: "fheSub",
        arg_types: "(uint256,uint256,bytes1)",
        payload_len: 65,
        required_gas: gas::fhe_sub_required_gas,
        run: exec::fhe_sub_run,
    },
    Method {
        name: "fheBitAnd",
        arg_types: "(uint256,uint256,bytes1)",
        payload_len: 65,
        required_gas: gas::fhe_bit_and_required_gas,
        run: exec::fhe_bit_and_run,
    },
    Method {
        name: "cast",
        arg_types: "(uint256,bytes1)",
        payload_len: 33,
        required_gas: gas::cast_required_gas,
        run: exec::cast_run,
    },
    Method {
        name: "decrypt",
        arg_types: "(uint256)",
        payload_len: 32,
        required_gas: gas::decrypt_required_gas,
        run: exec::decrypt_run,
    },
    Method {
        name: "fhePubKey",
        arg_types: "(bytes1)",
        payload_len: 1,
        required_gas: pubkey::fhe_pub_key_required_gas,
        run: pubkey::fhe_pub_key_run,
    },
    Method {
        name: "trivialEncrypt",
        arg_types: "(uint256,bytes1)",
        payload_len: 33,
        required_gas: gas::trivial_encrypt_required_gas,
        run: exec::trivial_encrypt_run,
    },
    Method {
        name: "optimisticRequire",
        arg_types: "(uint256)",
        payload_len: 32,
        required_gas: gas::optimistic_require_required_gas,
        run: exec::optimistic_require_run,
    },
    Method {
        name: "padGas",
        arg_types: "(uint256)",
        payload_len: 32,
        required_gas: gas::pad_gas_required_gas,
        run: exec::pad_gas_run,
    },
];

pub fn methods() -> &'static [Method] {
    &METHODS
}

/// Selector to method mapping, built on first use and read-only afterwards.
pub struct MethodTable {
    by_selector: HashMap<u32, &'static Method>,
}

impl MethodTable {
    fn build() -> Self {
        let by_selector = METHODS.iter().map(|m| (m.selector(), m)).collect();
        Self { by_selector }
    }

    pub fn get(&self, selector: u32) -> Option<&'static Method> {
        self.by_selector.get(&selector).copied()
    }

    pub fn len(&self) -> usize {
        self.by_selector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }
}

pub fn method_table() -> &'static MethodTable {
    static TABLE: OnceLock<MethodTable> = OnceLock::new();
    TABLE.get_or_init(MethodTable::build)
}

pub fn lookup(selector: u32) -> Option<&'static Method> {
    method_table().get(selector)
}
