use std::fmt;

use serde::{Deserialize, Serialize};
use subxt::dynamic::Value;

use crate::{DomainId, PrimitivesError, types::decode_hex};

/// Length of an ECDSA signature in `r || s || v` form.
pub const SIGNATURE_LEN: usize = 65;

/// Identifies the bridged resource a proposal moves.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub [u8; 32]);

impl ResourceId {
    /// A resource id whose last byte is `index` and all others zero.
    pub fn from_index(index: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[31] = index;
        Self(bytes)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId(0x{})", hex::encode(self.0))
    }
}

/// A cross-chain transfer attested by the MPC committee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub origin_domain_id: DomainId,
    pub deposit_nonce: u64,
    pub resource_id: ResourceId,
    pub data: Vec<u8>,
}

impl Proposal {
    pub fn to_value(&self) -> Value {
        Value::named_composite([
            ("origin_domain_id", self.origin_domain_id.to_value()),
            ("deposit_nonce", Value::u128(self.deposit_nonce as u128)),
            ("resource_id", Value::from_bytes(self.resource_id.0)),
            ("data", Value::from_bytes(&self.data)),
        ])
    }
}

/// MPC signature over a batch of proposals. Never verified locally.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSignature(pub Vec<u8>);

impl ProposalSignature {
    pub fn from_hex(input: &str) -> Result<Self, PrimitivesError> {
        decode_hex(input).map(Self)
    }

    /// Whether the signature has the `r || s || v` length the pallet expects.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == SIGNATURE_LEN
    }

    pub fn to_value(&self) -> Value {
        Value::from_bytes(&self.0)
    }
}

impl fmt::Debug for ProposalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalSignature(0x{})", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for ProposalSignature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
