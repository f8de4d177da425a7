use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use subxt::dynamic::Value;

use crate::PrimitivesError;

/// Identifier of a connected network in the bridge's domain registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(pub u8);

impl DomainId {
    pub fn to_value(self) -> Value {
        Value::u128(self.0 as u128)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for DomainId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// The 20-byte EVM address of the MPC signing authority.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MpcAddress(pub [u8; 20]);

impl MpcAddress {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_value(self) -> Value {
        Value::from_bytes(self.0)
    }
}

impl FromStr for MpcAddress {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| PrimitivesError::InvalidMpcAddress {
            input: s.to_string(),
            reason,
        };
        let raw = s.trim();
        let raw = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
        let bytes = hex::decode(raw).map_err(|e| invalid(e.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| invalid(format!("expected 20 bytes, got {}", b.len())))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for MpcAddress {
    type Error = PrimitivesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MpcAddress> for String {
    fn from(value: MpcAddress) -> Self {
        value.to_string()
    }
}

/// Always lower-case, the same form the runtime reports back.
impl fmt::Display for MpcAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for MpcAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MpcAddress({self})")
    }
}

/// Fee strategy attached to a `(domain, asset)` pair by the fee handler router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeHandlerType {
    BasicFeeHandler,
    PercentageFeeHandler,
    DynamicFeeHandler,
}

impl FeeHandlerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicFeeHandler => "BasicFeeHandler",
            Self::PercentageFeeHandler => "PercentageFeeHandler",
            Self::DynamicFeeHandler => "DynamicFeeHandler",
        }
    }

    pub fn to_value(self) -> Value {
        Value::unnamed_variant(self.as_str(), [])
    }
}

impl FromStr for FeeHandlerType {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" | "basicfeehandler" => Ok(Self::BasicFeeHandler),
            "percentage" | "percentagefeehandler" => Ok(Self::PercentageFeeHandler),
            "dynamic" | "dynamicfeehandler" => Ok(Self::DynamicFeeHandler),
            _ => Err(PrimitivesError::UnknownFeeHandler(s.to_string())),
        }
    }
}

/// Decodes `0x`-prefixed or bare hex into bytes.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, PrimitivesError> {
    let raw = input.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw).map_err(|e| PrimitivesError::InvalidHex {
        input: input.to_string(),
        reason: e.to_string(),
    })
}
