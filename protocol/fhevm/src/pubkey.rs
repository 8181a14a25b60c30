use std::fs;
use std::path::Path;

use revm::primitives::keccak256;
use tracing::{error, info};

use crate::abi::wrap_dynamic_bytes;
use crate::environment::Environment;
use crate::error::{FhevmError, FhevmResult};
use crate::Hash;

/// Flag byte asking for the blob as ABI dynamic `bytes`.
pub const WRAP_AS_DYNAMIC_BYTES: u8 = 0x01;

/// FHE public key blob served by `fhePubKey`.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
    hash: Hash,
}

impl PublicKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        let hash = keccak256(&bytes).0;
        Self { bytes, hash }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("len", &self.bytes.len())
            .field("hash", &hex::encode(self.hash))
            .finish()
    }
}

pub fn fhe_pub_key_required_gas(env: &dyn Environment, _supplied_gas: u64, _input: &[u8]) -> u64 {
    env.params().gas_costs.pub_key
}

pub fn fhe_pub_key_run(env: &mut dyn Environment, input: &[u8]) -> FhevmResult<Vec<u8>> {
    let Some(key) = env.public_key() else {
        error!("fhePubKey: no public key configured");
        return Err(FhevmError::PublicKeyMissing);
    };
    if env.stored_public_key_hash() != Some(key.hash()) {
        error!(
            expected = %hex::encode(key.hash()),
            "fhePubKey: public key hash does not match stored value"
        );
        return Err(FhevmError::PublicKeyMismatch);
    }
    let wrap = input.first() == Some(&WRAP_AS_DYNAMIC_BYTES);
    let out = if wrap {
        wrap_dynamic_bytes(key.bytes())
    } else {
        key.bytes().to_vec()
    };
    if env.mode().is_committing() {
        info!(len = out.len(), wrap, "fhePubKey success");
    }
    Ok(out)
}
