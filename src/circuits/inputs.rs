//! Argument maps handed to the proving backend.
//!
//! Every value is a decimal string; points are `[x, y]` arrays and Merkle
//! paths are arrays of arrays. Key names match the circuits' input signals.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::registry::{parse_decimal, BabyJubSignature, HubRegistry, MerkleProof, PublicKey};
use crate::primitives::groups::baby_jubjub::{Element, Scalar};
use crate::primitives::{BabyJubJub, ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs};
use crate::protocol::{SmpMessage1, SmpMessage2, SmpMessage3};
use crate::{Error, Result};

/// Input keys of the proof-of-SMP circuit.
pub const PROOF_OF_SMP_KEYS: [&str; 40] = [
    "merklePathElements",
    "merklePathIndices",
    "merkleRoot",
    "sigHubRegistryR8",
    "sigHubRegistryS",
    "adminAddress",
    "pubkeyC",
    "sigCR8",
    "sigCS",
    "pubkeyHub",
    "sigJoinMsgHubR8",
    "sigJoinMsgHubS",
    "h2",
    "h3",
    "r4h",
    "g2h",
    "g2hProofC",
    "g2hProofD",
    "g3h",
    "g3hProofC",
    "g3hProofD",
    "g2a",
    "g2aProofC",
    "g2aProofD",
    "g3a",
    "g3aProofC",
    "g3aProofD",
    "pa",
    "qa",
    "paqaProofC",
    "paqaProofD0",
    "paqaProofD1",
    "ph",
    "qh",
    "phqhProofC",
    "phqhProofD0",
    "phqhProofD1",
    "rh",
    "rhProofC",
    "rhProofD",
];

/// Input keys of the proof-of-successful-SMP circuit.
pub const PROOF_SUCCESSFUL_SMP_KEYS: [&str; 7] =
    ["a3", "pa", "ph", "rh", "pubkeyA", "sigRhR8", "sigRhS"];

/// One circuit input: a decimal value or a nested array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CircuitArg {
    /// A decimal big integer.
    Value(String),
    /// An array of inputs.
    Array(Vec<CircuitArg>),
}

impl CircuitArg {
    /// A big integer.
    pub fn int(value: &BigUint) -> Self {
        CircuitArg::Value(value.to_string())
    }

    /// A scalar.
    pub fn scalar(value: &Scalar) -> Self {
        Self::int(&value.to_biguint())
    }

    /// A point as `[x, y]`.
    pub fn point(value: &Element) -> Self {
        let [x, y] = value.coordinates();
        CircuitArg::Array(vec![Self::int(&x), Self::int(&y)])
    }

    /// Parses a scalar value.
    pub fn as_biguint(&self) -> Result<BigUint> {
        match self {
            CircuitArg::Value(s) => parse_decimal(s),
            CircuitArg::Array(_) => Err(Error::MalformedInput(
                "expected a value, found an array".to_string(),
            )),
        }
    }

    /// Parses a `[x, y]` point.
    pub fn as_point(&self) -> Result<Element> {
        match self {
            CircuitArg::Array(items) if items.len() == 2 => {
                Element::from_coordinates(&items[0].as_biguint()?, &items[1].as_biguint()?)
            }
            _ => Err(Error::MalformedInput("expected an [x, y] point".to_string())),
        }
    }

    /// Appends every leaf value in order.
    pub fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            CircuitArg::Value(s) => out.push(s.clone()),
            CircuitArg::Array(items) => items.iter().for_each(|item| item.flatten_into(out)),
        }
    }
}

impl From<u64> for CircuitArg {
    fn from(v: u64) -> Self {
        CircuitArg::Value(v.to_string())
    }
}

/// A named argument map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircuitArgs(BTreeMap<String, CircuitArg>);

impl CircuitArgs {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`.
    pub fn insert(&mut self, key: &str, value: CircuitArg) {
        self.0.insert(key.to_string(), value);
    }

    /// Looks up `key`.
    pub fn get(&self, key: &str) -> Option<&CircuitArg> {
        self.0.get(key)
    }

    /// Looks up `key`, failing if it is absent.
    pub fn require(&self, key: &str) -> Result<&CircuitArg> {
        self.get(key)
            .ok_or_else(|| Error::MalformedInput(format!("missing circuit input {key:?}")))
    }

    /// Iterates keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert_dl(&mut self, prefix: &str, point: &Element, proof: &ProofDiscreteLog<BabyJubJub>) {
        self.insert(prefix, CircuitArg::point(point));
        self.insert(&format!("{prefix}ProofC"), CircuitArg::scalar(proof.c()));
        self.insert(&format!("{prefix}ProofD"), CircuitArg::scalar(proof.d()));
    }

    fn insert_edc(
        &mut self,
        prefix: &str,
        proof: &ProofEqualDiscreteCoordinates<BabyJubJub>,
    ) {
        self.insert(&format!("{prefix}ProofC"), CircuitArg::scalar(proof.c()));
        self.insert(&format!("{prefix}ProofD0"), CircuitArg::scalar(proof.d0()));
        self.insert(&format!("{prefix}ProofD1"), CircuitArg::scalar(proof.d1()));
    }

    fn insert_edl(&mut self, prefix: &str, point: &Element, proof: &ProofEqualDiscreteLogs<BabyJubJub>) {
        self.insert(prefix, CircuitArg::point(point));
        self.insert(&format!("{prefix}ProofC"), CircuitArg::scalar(proof.c()));
        self.insert(&format!("{prefix}ProofD"), CircuitArg::scalar(proof.d()));
    }

    fn insert_signature(&mut self, prefix: &str, sig: &BabyJubSignature) {
        self.insert(&format!("{prefix}R8"), CircuitArg::point(sig.r8()));
        self.insert(&format!("{prefix}S"), CircuitArg::scalar(sig.s()));
    }
}

/// Everything the hub needs to prove it ran an SMP with the searcher.
///
/// The hub is the SMP initiator: `msg1` and `msg3` are its own messages,
/// `msg2` is the searcher's, and `h2, h3, r4h` are its ephemeral exponents.
#[derive(Clone, Debug)]
pub struct ProofOfSmpInput {
    /// Hub's `g2` exponent.
    pub h2: Scalar,
    /// Hub's `g3` exponent.
    pub h3: Scalar,
    /// Hub's `r4`.
    pub r4h: Scalar,
    /// Stage 1, sent by the hub.
    pub msg1: SmpMessage1<BabyJubJub>,
    /// Stage 2, sent by the searcher.
    pub msg2: SmpMessage2<BabyJubJub>,
    /// Stage 3, sent by the hub.
    pub msg3: SmpMessage3<BabyJubJub>,
    /// The hub's registry membership.
    pub merkle_proof: MerkleProof,
    /// The hub's registration.
    pub hub_registry: HubRegistry,
    /// The target user the hub vouches for.
    pub pubkey_c: PublicKey,
    /// The hub's key.
    pub pubkey_hub: PublicKey,
    /// Target's signature over the join message.
    pub sig_join_msg_c: BabyJubSignature,
    /// Hub's countersignature over the join message.
    pub sig_join_msg_hub: BabyJubSignature,
}

/// Everything the searcher needs to prove the SMP succeeded.
#[derive(Clone, Debug)]
pub struct ProofSuccessfulSmpInput {
    /// Searcher's `g3` exponent.
    pub a3: Scalar,
    /// Searcher's `P` (sent in message 2).
    pub pa: Element,
    /// Hub's `P` (sent in message 3).
    pub ph: Element,
    /// Hub's `R` (sent in message 3).
    pub rh: Element,
    /// Searcher's key.
    pub pubkey_a: PublicKey,
    /// Searcher's signature over `H(rh)`.
    pub sig_rh: BabyJubSignature,
}

/// Builds the proof-of-SMP argument map.
///
/// # Errors
///
/// [`Error::MalformedInput`] if the hub registry does not verify.
pub fn proof_of_smp_args(input: &ProofOfSmpInput) -> Result<CircuitArgs> {
    if !input.hub_registry.verify() {
        return Err(Error::MalformedInput("registry is invalid".to_string()));
    }
    let mut args = CircuitArgs::new();

    let proof = &input.merkle_proof;
    args.insert(
        "merklePathElements",
        CircuitArg::Array(
            proof
                .path_elements()
                .iter()
                .map(|level| CircuitArg::Array(level.iter().map(CircuitArg::int).collect()))
                .collect(),
        ),
    );
    args.insert(
        "merklePathIndices",
        CircuitArg::Array(proof.indices().iter().map(|i| CircuitArg::from(*i)).collect()),
    );
    args.insert("merkleRoot", CircuitArg::int(proof.root()));

    args.insert_signature("sigHubRegistry", input.hub_registry.sig());
    args.insert(
        "adminAddress",
        CircuitArg::int(input.hub_registry.admin_address().value()),
    );
    args.insert("pubkeyC", CircuitArg::point(input.pubkey_c.element()));
    args.insert_signature("sigC", &input.sig_join_msg_c);
    args.insert("pubkeyHub", CircuitArg::point(input.pubkey_hub.element()));
    args.insert_signature("sigJoinMsgHub", &input.sig_join_msg_hub);

    args.insert("h2", CircuitArg::scalar(&input.h2));
    args.insert("h3", CircuitArg::scalar(&input.h3));
    args.insert("r4h", CircuitArg::scalar(&input.r4h));

    let msg1 = &input.msg1;
    args.insert_dl("g2h", &msg1.g2a, &msg1.g2a_proof);
    args.insert_dl("g3h", &msg1.g3a, &msg1.g3a_proof);

    let msg2 = &input.msg2;
    args.insert_dl("g2a", &msg2.g2b, &msg2.g2b_proof);
    args.insert_dl("g3a", &msg2.g3b, &msg2.g3b_proof);
    args.insert("pa", CircuitArg::point(&msg2.pb));
    args.insert("qa", CircuitArg::point(&msg2.qb));
    args.insert_edc("paqa", &msg2.pbqb_proof);

    let msg3 = &input.msg3;
    args.insert("ph", CircuitArg::point(&msg3.pa));
    args.insert("qh", CircuitArg::point(&msg3.qa));
    args.insert_edc("phqh", &msg3.paqa_proof);
    args.insert_edl("rh", &msg3.ra, &msg3.ra_proof);

    Ok(args)
}

/// Builds the proof-of-successful-SMP argument map.
pub fn proof_successful_smp_args(input: &ProofSuccessfulSmpInput) -> CircuitArgs {
    let mut args = CircuitArgs::new();
    args.insert("a3", CircuitArg::scalar(&input.a3));
    args.insert("pa", CircuitArg::point(&input.pa));
    args.insert("ph", CircuitArg::point(&input.ph));
    args.insert("rh", CircuitArg::point(&input.rh));
    args.insert("pubkeyA", CircuitArg::point(input.pubkey_a.element()));
    args.insert_signature("sigRh", &input.sig_rh);
    args
}
