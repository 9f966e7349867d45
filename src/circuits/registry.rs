//! Identities, hub registrations and Merkle membership witnesses.
//!
//! Keys are Baby Jubjub points and signatures are the Schnorr signatures of
//! [`crate::primitives::signature`]. Everything here is what the circuits
//! consume as private inputs or expose as public signals.

use core::fmt;
use core::str::FromStr;

use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::primitives::groups::baby_jubjub::{Element, Scalar};
use crate::primitives::{BabyJubJub, Keypair, Signature, Transcript};
use crate::{Error, Group, Result};

/// Key pair over Baby Jubjub.
pub type BabyJubKeypair = Keypair<BabyJubJub>;

/// Signature over Baby Jubjub.
pub type BabyJubSignature = Signature<BabyJubJub>;

const HASH_POINT_DOMAIN: &[u8] = b"hash-point-to-scalar";
const JOIN_HUB_DOMAIN: &[u8] = b"join-hub";
const HUB_REGISTRY_DOMAIN: &[u8] = b"hub-registry";

/// Width in bytes of an admin (Ethereum) address.
pub const ADMIN_ADDRESS_BYTES: usize = 20;

/// Hashes a point to a scalar, e.g. `rh` before the searcher signs it.
pub fn hash_point_to_scalar(point: &Element) -> Scalar {
    let mut transcript = Transcript::with_domain(HASH_POINT_DOMAIN);
    transcript.append_group_name(BabyJubJub::name());
    transcript.append_element::<BabyJubJub>(b"point", point);
    transcript.challenge_scalar::<BabyJubJub>()
}

/// The message a user and a hub both sign when the user joins the hub.
pub fn join_hub_message(user: &PublicKey, hub: &PublicKey) -> Scalar {
    let mut transcript = Transcript::with_domain(JOIN_HUB_DOMAIN);
    transcript.append_group_name(BabyJubJub::name());
    transcript.append_element::<BabyJubJub>(b"user", user.element());
    transcript.append_element::<BabyJubJub>(b"hub", hub.element());
    transcript.challenge_scalar::<BabyJubJub>()
}

/// A public key: a point of the Baby Jubjub subgroup.
///
/// Serialized as `[x, y]` decimal strings, the way circuits see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(Element);

impl PublicKey {
    /// Wraps a subgroup point.
    pub fn new(element: Element) -> Self {
        Self(element)
    }

    /// Builds a key from affine coordinates.
    pub fn from_coordinates(x: &BigUint, y: &BigUint) -> Result<Self> {
        Element::from_coordinates(x, y).map(Self)
    }

    /// Returns the underlying point.
    pub fn element(&self) -> &Element {
        &self.0
    }

    /// Affine coordinates `[x, y]`.
    pub fn coordinates(&self) -> [BigUint; 2] {
        self.0.coordinates()
    }

    /// Hex encoding of the 64-byte point.
    pub fn to_hex(&self) -> String {
        hex::encode(BabyJubJub::element_to_bytes(&self.0))
    }

    /// Parses the hex encoding produced by [`PublicKey::to_hex`].
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| Error::MalformedInput(format!("public key is not hex: {e}")))?;
        BabyJubJub::element_from_bytes(&bytes).map(Self)
    }
}

impl From<&BabyJubKeypair> for PublicKey {
    fn from(keypair: &BabyJubKeypair) -> Self {
        Self(*keypair.public())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let [x, y] = self.coordinates();
        [x.to_string(), y.to_string()].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let [x, y] = <[String; 2]>::deserialize(deserializer)?;
        let x = parse_decimal(&x).map_err(serde::de::Error::custom)?;
        let y = parse_decimal(&y).map_err(serde::de::Error::custom)?;
        Self::from_coordinates(&x, &y).map_err(serde::de::Error::custom)
    }
}

/// Parses a decimal big integer.
pub fn parse_decimal(s: &str) -> Result<BigUint> {
    BigUint::from_str(s).map_err(|e| Error::MalformedInput(format!("{s:?} is not a decimal: {e}")))
}

/// The registry admin's 20-byte address, held as an integer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AdminAddress(BigUint);

impl AdminAddress {
    /// Wraps an integer, rejecting values wider than 20 bytes.
    pub fn new(value: BigUint) -> Result<Self> {
        if value.bits() > (ADMIN_ADDRESS_BYTES * 8) as u64 {
            return Err(Error::MalformedInput(
                "admin address is wider than 20 bytes".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Parses a `0x`-prefixed 40-digit hex address.
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| Error::MalformedInput(format!("admin address {s:?} lacks 0x")))?;
        let bytes = hex::decode(digits)
            .map_err(|e| Error::MalformedInput(format!("admin address is not hex: {e}")))?;
        if bytes.len() != ADMIN_ADDRESS_BYTES {
            return Err(Error::MalformedInput(format!(
                "admin address has {} bytes, expected {}",
                bytes.len(),
                ADMIN_ADDRESS_BYTES
            )));
        }
        Ok(Self(BigUint::from_bytes_be(&bytes)))
    }

    /// The address as an integer.
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Big-endian bytes, left-padded to 20.
    pub fn to_bytes(&self) -> [u8; ADMIN_ADDRESS_BYTES] {
        let raw = self.0.to_bytes_be();
        let mut out = [0u8; ADMIN_ADDRESS_BYTES];
        out[ADMIN_ADDRESS_BYTES - raw.len()..].copy_from_slice(&raw);
        out
    }
}

impl fmt::Display for AdminAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl Serialize for AdminAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for AdminAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_decimal(&s)
            .and_then(Self::new)
            .map_err(serde::de::Error::custom)
    }
}

/// A hub's self-registration: its key signed over the admin address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HubRegistry {
    pubkey: PublicKey,
    sig: BabyJubSignature,
    admin_address: AdminAddress,
}

impl HubRegistry {
    /// Assembles a registry entry from its parts without checking it.
    pub fn new(pubkey: PublicKey, sig: BabyJubSignature, admin_address: AdminAddress) -> Self {
        Self {
            pubkey,
            sig,
            admin_address,
        }
    }

    /// Registers `hub` under `admin_address`.
    pub fn sign<R: CryptoRngCore>(
        hub: &BabyJubKeypair,
        admin_address: AdminAddress,
        rng: &mut R,
    ) -> Self {
        let pubkey = PublicKey::from(hub);
        let sig = hub.sign(&Self::message(&pubkey, &admin_address), rng);
        Self::new(pubkey, sig, admin_address)
    }

    /// The signed message `H(pubkey, admin_address)`.
    pub fn message(pubkey: &PublicKey, admin_address: &AdminAddress) -> Scalar {
        let mut transcript = Transcript::with_domain(HUB_REGISTRY_DOMAIN);
        transcript.append_group_name(BabyJubJub::name());
        transcript.append_element::<BabyJubJub>(b"hub", pubkey.element());
        transcript.append_bytes(b"admin", &admin_address.to_bytes());
        transcript.challenge_scalar::<BabyJubJub>()
    }

    /// Checks the self-signature against the declared key and admin address.
    pub fn verify(&self) -> bool {
        self.sig
            .verify(
                self.pubkey.element(),
                &Self::message(&self.pubkey, &self.admin_address),
            )
            .is_ok()
    }

    /// The hub's key.
    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    /// The self-signature.
    pub fn sig(&self) -> &BabyJubSignature {
        &self.sig
    }

    /// The admin address the hub registered under.
    pub fn admin_address(&self) -> &AdminAddress {
        &self.admin_address
    }
}

/// Membership witness for a registry entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    path_elements: Vec<Vec<BigUint>>,
    indices: Vec<u64>,
    root: BigUint,
    leaf: BigUint,
}

impl MerkleProof {
    /// Builds a witness; one index per level, one sibling list per level.
    pub fn new(
        path_elements: Vec<Vec<BigUint>>,
        indices: Vec<u64>,
        root: BigUint,
        leaf: BigUint,
    ) -> Result<Self> {
        if path_elements.len() != indices.len() {
            return Err(Error::MalformedInput(format!(
                "merkle proof has {} levels of siblings but {} indices",
                path_elements.len(),
                indices.len()
            )));
        }
        Ok(Self {
            path_elements,
            indices,
            root,
            leaf,
        })
    }

    /// Sibling hashes, bottom level first.
    pub fn path_elements(&self) -> &[Vec<BigUint>] {
        &self.path_elements
    }

    /// Position at each level.
    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Tree depth.
    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// Root this witness opens to.
    pub fn root(&self) -> &BigUint {
        &self.root
    }
}
