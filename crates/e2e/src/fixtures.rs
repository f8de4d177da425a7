//! Pre-signed proposals accepted by the standalone dev runtime.
//!
//! The signatures were produced offline by the dev MPC key registered at
//! [`crate::config::E2eConfig::mpc_address`]. Changing any proposal byte
//! invalidates its signature.

use sygma_primitives::{DomainId, Proposal, ProposalSignature, ResourceId};

/// Transfer payload shared by both fixture proposals: a 32-byte amount
/// followed by a length-prefixed recipient location.
const TRANSFER_DATA: [u8; 100] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 90, 243, 16, 122,
    64, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 36, 0, 1, 1, 0, 212, 53, 147, 199, 21, 253, 211, 28, 97, 20, 26, 189, 4, 169, 159, 214,
    130, 44, 133, 88, 133, 76, 205, 227, 154, 86, 132, 231, 165, 109, 162, 125,
];

const USDC_SIGNATURE: [u8; 65] = [
    180, 250, 104, 54, 47, 69, 174, 209, 145, 226, 25, 32, 184, 96, 142, 125, 103, 53, 60, 180,
    107, 207, 80, 188, 9, 138, 218, 97, 50, 132, 193, 10, 6, 15, 186, 139, 6, 21, 63, 39, 157,
    144, 81, 12, 81, 165, 215, 213, 200, 105, 198, 105, 115, 193, 42, 183, 145, 118, 52, 47, 45,
    198, 165, 5, 28,
];

const NATIVE_SIGNATURE: [u8; 65] = [
    57, 218, 225, 125, 128, 217, 23, 82, 49, 217, 8, 197, 110, 174, 42, 157, 129, 43, 22, 63, 215,
    213, 100, 179, 17, 170, 23, 95, 72, 80, 78, 181, 108, 176, 60, 138, 137, 29, 157, 138, 244, 0,
    5, 180, 128, 243, 48, 99, 175, 53, 140, 245, 162, 111, 36, 65, 89, 208, 41, 69, 209, 149, 247,
    149, 28,
];

/// One proposal with the signature that authorizes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedProposal {
    pub proposal: Proposal,
    pub signature: ProposalSignature,
}

/// USDC transfer from domain 1, deposit nonce 2.
pub fn usdc_proposal() -> SignedProposal {
    let mut resource = [0u8; 32];
    resource[30] = 3;
    SignedProposal {
        proposal: Proposal {
            origin_domain_id: DomainId(1),
            deposit_nonce: 2,
            resource_id: ResourceId(resource),
            data: TRANSFER_DATA.to_vec(),
        },
        signature: USDC_SIGNATURE.to_vec().into(),
    }
}

/// Native token transfer from domain 1, deposit nonce 3.
pub fn native_proposal() -> SignedProposal {
    SignedProposal {
        proposal: Proposal {
            origin_domain_id: DomainId(1),
            deposit_nonce: 3,
            resource_id: ResourceId::from_index(1),
            data: TRANSFER_DATA.to_vec(),
        },
        signature: NATIVE_SIGNATURE.to_vec().into(),
    }
}
