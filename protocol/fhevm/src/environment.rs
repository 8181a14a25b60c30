use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ciphertext::{Ciphertext, CiphertextEngine, Handle};
use serde::{Deserialize, Serialize};

use crate::params::FhevmParams;
use crate::pubkey::PublicKey;
use crate::registry::Registry;
use crate::require::OptimisticRequires;
use crate::Hash;

/// How the host is running the current call. Chosen once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Gas probing; no state will be committed and results are not real.
    Estimating,
    /// Read-only call, executed for real.
    StaticCall,
    /// State-mutating execution.
    Committing,
}

impl ExecutionMode {
    pub fn from_host_flags(is_committing: bool, is_static_call: bool) -> Self {
        if is_committing {
            ExecutionMode::Committing
        } else if is_static_call {
            ExecutionMode::StaticCall
        } else {
            ExecutionMode::Estimating
        }
    }

    pub fn is_estimating(self) -> bool {
        self == ExecutionMode::Estimating
    }

    pub fn is_committing(self) -> bool {
        self == ExecutionMode::Committing
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionMode::Estimating => "estimate",
            ExecutionMode::StaticCall => "static",
            ExecutionMode::Committing => "commit",
        };
        f.write_str(s)
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "estimate" | "estimating" => Ok(ExecutionMode::Estimating),
            "static" | "static-call" => Ok(ExecutionMode::StaticCall),
            "commit" | "committing" => Ok(ExecutionMode::Committing),
            other => Err(format!("unknown execution mode {other}")),
        }
    }
}

/// Per-context state owned on behalf of the precompiles.
#[derive(Debug, Clone, Default)]
pub struct FhevmData {
    pub registry: Registry,
    pub optimistic_requires: OptimisticRequires,
}

/// What the precompiles need from the host for the duration of one call.
pub trait Environment {
    fn mode(&self) -> ExecutionMode;
    fn depth(&self) -> usize;
    fn gas_limit(&self) -> u64;
    fn params(&self) -> &FhevmParams;
    fn engine(&self) -> &dyn CiphertextEngine;
    fn fhevm_data(&self) -> &FhevmData;
    fn fhevm_data_mut(&mut self) -> &mut FhevmData;
    fn public_key(&self) -> Option<&PublicKey>;
    /// Public key hash as recorded in host state, if any.
    fn stored_public_key_hash(&self) -> Option<Hash>;

    fn verified_ciphertext(&self, handle: &Handle) -> Option<Arc<Ciphertext>> {
        self.fhevm_data().registry.get(handle, self.depth())
    }

    /// Registers `ciphertext` at the current depth under its content hash.
    fn import_ciphertext(&mut self, ciphertext: Ciphertext) -> Handle {
        let depth = self.depth();
        self.fhevm_data_mut().registry.import(ciphertext, depth)
    }
}

/// Self-contained environment for hosts that do not keep their own.
pub struct ExecutionContext<E: CiphertextEngine> {
    engine: E,
    params: Arc<FhevmParams>,
    public_key: Option<Arc<PublicKey>>,
    stored_public_key_hash: Option<Hash>,
    mode: ExecutionMode,
    depth: usize,
    gas_limit: u64,
    data: FhevmData,
}

impl<E: CiphertextEngine> ExecutionContext<E> {
    pub fn new(engine: E, params: Arc<FhevmParams>, mode: ExecutionMode) -> Self {
        Self {
            engine,
            params,
            public_key: None,
            stored_public_key_hash: None,
            mode,
            depth: 1,
            gas_limit: 30_000_000,
            data: FhevmData::default(),
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_public_key(mut self, key: Arc<PublicKey>, stored_hash: Option<Hash>) -> Self {
        self.public_key = Some(key);
        self.stored_public_key_hash = stored_hash;
        self
    }

    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    pub fn engine_ref(&self) -> &E {
        &self.engine
    }
}

impl<E: CiphertextEngine> Environment for ExecutionContext<E> {
    fn mode(&self) -> ExecutionMode {
        self.mode
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    fn params(&self) -> &FhevmParams {
        &self.params
    }

    fn engine(&self) -> &dyn CiphertextEngine {
        &self.engine
    }

    fn fhevm_data(&self) -> &FhevmData {
        &self.data
    }

    fn fhevm_data_mut(&mut self) -> &mut FhevmData {
        &mut self.data
    }

    fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_deref()
    }

    fn stored_public_key_hash(&self) -> Option<Hash> {
        self.stored_public_key_hash
    }
}
