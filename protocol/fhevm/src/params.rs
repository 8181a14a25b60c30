use std::fs;
use std::path::Path;

use ciphertext::FheUintType;
use serde::{Deserialize, Serialize};

/// One price per encrypted width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePrices {
    pub uint4: u64,
    pub uint8: u64,
    pub uint16: u64,
    pub uint32: u64,
    pub uint64: u64,
}

impl TypePrices {
    pub const fn uniform(gas: u64) -> Self {
        Self {
            uint4: gas,
            uint8: gas,
            uint16: gas,
            uint32: gas,
            uint64: gas,
        }
    }

    pub fn get(&self, fhe_type: FheUintType) -> u64 {
        match fhe_type {
            FheUintType::FheUint4 => self.uint4,
            FheUintType::FheUint8 => self.uint8,
            FheUintType::FheUint16 => self.uint16,
            FheUintType::FheUint32 => self.uint32,
            FheUintType::FheUint64 => self.uint64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasCosts {
    pub add_sub: TypePrices,
    pub bitwise: TypePrices,
    pub decrypt: TypePrices,
    pub trivial_encrypt: TypePrices,
    pub optimistic_require: TypePrices,
    pub cast: u64,
    pub pub_key: u64,
}

impl Default for GasCosts {
    fn default() -> Self {
        Self {
            add_sub: TypePrices {
                uint4: 61_000,
                uint8: 83_000,
                uint16: 108_000,
                uint32: 130_000,
                uint64: 162_000,
            },
            bitwise: TypePrices {
                uint4: 20_000,
                uint8: 20_000,
                uint16: 21_000,
                uint32: 22_000,
                uint64: 24_000,
            },
            decrypt: TypePrices::uniform(500_000),
            trivial_encrypt: TypePrices {
                uint4: 100,
                uint8: 100,
                uint16: 200,
                uint32: 300,
                uint64: 600,
            },
            optimistic_require: TypePrices {
                uint4: 160_000,
                uint8: 170_000,
                uint16: 180_000,
                uint32: 190_000,
                uint64: 200_000,
            },
            cast: 200,
            pub_key: 2,
        }
    }
}

/// Static configuration shared by every execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FhevmParams {
    pub gas_costs: GasCosts,
}

impl FhevmParams {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let params: FhevmParams = serde_json::from_str(&contents)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: FhevmParams =
            serde_json::from_str(r#"{"gas_costs": {"cast": 7}}"#).unwrap();
        assert_eq!(params.gas_costs.cast, 7);
        assert_eq!(params.gas_costs.pub_key, GasCosts::default().pub_key);
        assert_eq!(params.gas_costs.decrypt, TypePrices::uniform(500_000));
    }

    #[test]
    fn prices_are_looked_up_by_type() {
        let costs = GasCosts::default();
        assert_eq!(costs.add_sub.get(FheUintType::FheUint8), 83_000);
        assert_eq!(costs.trivial_encrypt.get(FheUintType::FheUint64), 600);
    }
}
