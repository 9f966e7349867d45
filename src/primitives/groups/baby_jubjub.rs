//! Baby Jubjub group implementation.
//!
//! Baby Jubjub is the twisted Edwards curve defined over the scalar field of
//! BN254, which makes its points cheap to handle inside BN254 zk-SNARK
//! circuits. All protocol values live in its prime-order subgroup.
//!
//! # Encoding
//!
//! - Scalars: 32 bytes, big-endian, strictly below the subgroup order.
//! - Points: 64 bytes, affine `x ‖ y`, each coordinate 32 bytes big-endian.
//!
//! # Coordinates
//!
//! Every coordinate that leaves this module (wire bytes, circuit arguments,
//! public signals) is in circomlib's model `a·x² + y² = 1 + d·x²·y²` with
//! `a = 168700`, `d = 168696`. arkworks stores the same curve rescaled to
//! `a = 1`, i.e. `x_ark = sqrt(a)·x`; `y` is shared. The conversion happens
//! only in `circom_coordinates` (outbound) and `Element::from_circom` (inbound).

use std::sync::OnceLock;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fq, Fr};
use ark_ff::{BigInteger, Field, MontFp, PrimeField};
use ark_std::Zero;
use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::{Error, Group, Result};

/// Number of bytes in a Baby Jubjub scalar (32 bytes).
const SCALAR_BYTES: usize = 32;

/// Number of bytes in one affine coordinate (32 bytes).
const COORDINATE_BYTES: usize = 32;

/// Number of bytes in an encoded point (`x ‖ y`).
const POINT_BYTES: usize = 2 * COORDINATE_BYTES;

/// Number of bytes used for wide scalar reduction.
const WIDE_REDUCTION_BYTES: usize = 64;

/// `sqrt(168700)`, mapping circomlib `x` to arkworks `x`.
const SQRT_A: Fq =
    MontFp!("7214280148105020021932206872019688659210616427216992810330019057549499971851");

/// `1 / sqrt(168700)`, mapping arkworks `x` back to circomlib `x`.
const SQRT_A_INV: Fq =
    MontFp!("2957874849018779266517920829765869116077630550401372566248359756137677864698");

/// circomlib `Base8`, generator of the prime-order subgroup.
const BASE8_X: Fq =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const BASE8_Y: Fq =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

/// Baby Jubjub group implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BabyJubJub;

/// Scalar modulo the Baby Jubjub subgroup order.
///
/// Scalars are automatically zeroized when dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scalar(
    #[serde(
        serialize_with = "serialize_scalar",
        deserialize_with = "deserialize_scalar"
    )]
    Fr,
);

/// Element (point) of the Baby Jubjub prime-order subgroup.
///
/// Points are kept in projective coordinates for arithmetic and encoded in
/// affine form.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element(
    #[serde(
        serialize_with = "serialize_element",
        deserialize_with = "deserialize_element"
    )]
    EdwardsProjective,
);

fn serialize_scalar<S>(scalar: &Fr, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_bytes(&field_to_be_bytes(scalar))
}

fn deserialize_scalar<'de, D>(deserializer: D) -> std::result::Result<Fr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
    if bytes.len() != SCALAR_BYTES {
        return Err(serde::de::Error::invalid_length(
            bytes.len(),
            &"32 bytes for Baby Jubjub scalar",
        ));
    }
    field_from_be_bytes(&bytes).ok_or_else(|| serde::de::Error::custom("Invalid Baby Jubjub scalar"))
}

fn serialize_element<S>(
    element: &EdwardsProjective,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_bytes(&encode_point(element))
}

fn deserialize_element<'de, D>(deserializer: D) -> std::result::Result<EdwardsProjective, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
    decode_point(&bytes)
        .map(|e| e.0)
        .map_err(|e| serde::de::Error::custom(e.to_string()))
}

fn field_to_be_bytes<F: PrimeField>(value: &F) -> Vec<u8> {
    value.into_bigint().to_bytes_be()
}

fn field_to_biguint<F: PrimeField>(value: &F) -> BigUint {
    BigUint::from_bytes_be(&field_to_be_bytes(value))
}

fn field_modulus<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

/// Parses a canonical big-endian field element, rejecting values `>= p`.
fn field_from_be_bytes<F: PrimeField>(bytes: &[u8]) -> Option<F> {
    if BigUint::from_bytes_be(bytes) >= field_modulus::<F>() {
        return None;
    }
    Some(F::from_be_bytes_mod_order(bytes))
}

fn field_from_biguint<F: PrimeField>(value: &BigUint) -> Option<F> {
    field_from_be_bytes(&value.to_bytes_be())
}

/// Affine coordinates in circomlib's model.
fn circom_coordinates(point: &EdwardsProjective) -> (Fq, Fq) {
    let affine = point.into_affine();
    (affine.x * SQRT_A_INV, affine.y)
}

fn encode_point(point: &EdwardsProjective) -> Vec<u8> {
    let (x, y) = circom_coordinates(point);
    let mut out = Vec::with_capacity(POINT_BYTES);
    out.extend_from_slice(&field_to_be_bytes(&x));
    out.extend_from_slice(&field_to_be_bytes(&y));
    out
}

fn decode_point(bytes: &[u8]) -> Result<Element> {
    if bytes.len() != POINT_BYTES {
        return Err(Error::MalformedInput(format!(
            "Expected {} bytes for a point, got {}",
            POINT_BYTES,
            bytes.len()
        )));
    }
    let (x_bytes, y_bytes) = bytes.split_at(COORDINATE_BYTES);
    let x = field_from_be_bytes::<Fq>(x_bytes)
        .ok_or_else(|| Error::MalformedInput("x coordinate out of range".to_string()))?;
    let y = field_from_be_bytes::<Fq>(y_bytes)
        .ok_or_else(|| Error::MalformedInput("y coordinate out of range".to_string()))?;
    Element::from_circom(x, y)
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0 = Fr::zero();
    }
}

impl Drop for Scalar {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        field_to_be_bytes(&self.0).ct_eq(&field_to_be_bytes(&other.0))
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.0.into_affine() == other.0.into_affine()
    }
}

impl Eq for Element {}

impl Scalar {
    /// Returns the scalar as a big integer in `[0, n)`.
    pub fn to_biguint(&self) -> BigUint {
        field_to_biguint(&self.0)
    }

    /// Builds a scalar from a big integer, rejecting values `>= n`.
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        field_from_biguint(value)
            .map(Scalar)
            .ok_or_else(|| Error::MalformedInput("scalar is not below the group order".to_string()))
    }

    /// Returns the multiplicative inverse, or `None` for zero.
    pub fn invert(&self) -> Option<Self> {
        self.0.inverse().map(Scalar)
    }

    /// Returns the subgroup order `n`.
    pub fn order() -> BigUint {
        field_modulus::<Fr>()
    }
}

impl Element {
    /// Validates circomlib coordinates and moves them into the arkworks model.
    fn from_circom(x: Fq, y: Fq) -> Result<Self> {
        let affine = EdwardsAffine::new_unchecked(x * SQRT_A, y);
        if !affine.is_on_curve() {
            return Err(Error::MalformedInput(
                "Point is not on the Baby Jubjub curve".to_string(),
            ));
        }
        if !affine.is_in_correct_subgroup_assuming_on_curve() {
            return Err(Error::MalformedInput(
                "Point is not in the prime-order subgroup".to_string(),
            ));
        }
        Ok(Element(EdwardsProjective::from(affine)))
    }

    /// Builds a point from its affine coordinates given as big integers.
    ///
    /// This is how points arrive from zk-SNARK public signals.
    pub fn from_coordinates(x: &BigUint, y: &BigUint) -> Result<Self> {
        let x = field_from_biguint::<Fq>(x)
            .ok_or_else(|| Error::MalformedInput("x coordinate out of range".to_string()))?;
        let y = field_from_biguint::<Fq>(y)
            .ok_or_else(|| Error::MalformedInput("y coordinate out of range".to_string()))?;
        Self::from_circom(x, y)
    }

    /// Returns the circomlib affine coordinates `[x, y]` as big integers.
    pub fn coordinates(&self) -> [BigUint; 2] {
        let (x, y) = circom_coordinates(&self.0);
        [field_to_biguint(&x), field_to_biguint(&y)]
    }
}

fn base_point() -> EdwardsProjective {
    static BASE: OnceLock<EdwardsProjective> = OnceLock::new();
    *BASE.get_or_init(|| EdwardsAffine::new_unchecked(BASE8_X * SQRT_A, BASE8_Y).into_group())
}

impl Group for BabyJubJub {
    type Scalar = Scalar;
    type Element = Element;

    const SCALAR_BYTES: usize = SCALAR_BYTES;
    const ELEMENT_BYTES: usize = POINT_BYTES;

    fn name() -> &'static str {
        "BabyJubJub"
    }

    fn generator() -> Self::Element {
        Element(base_point())
    }

    fn scalar_from_bytes(bytes: &[u8]) -> Result<Self::Scalar> {
        if bytes.len() != SCALAR_BYTES {
            return Err(Error::MalformedInput(format!(
                "Expected {} bytes for a scalar, got {}",
                SCALAR_BYTES,
                bytes.len()
            )));
        }
        field_from_be_bytes(bytes)
            .map(Scalar)
            .ok_or_else(|| Error::MalformedInput("Scalar is not below the group order".to_string()))
    }

    fn scalar_to_bytes(scalar: &Self::Scalar) -> Vec<u8> {
        field_to_be_bytes(&scalar.0)
    }

    fn scalar_from_bytes_mod_order(bytes: &[u8]) -> Self::Scalar {
        Scalar(Fr::from_le_bytes_mod_order(bytes))
    }

    fn element_from_bytes(bytes: &[u8]) -> Result<Self::Element> {
        decode_point(bytes)
    }

    fn element_to_bytes(element: &Self::Element) -> Vec<u8> {
        encode_point(&element.0)
    }

    fn random_scalar<R: CryptoRngCore>(rng: &mut R) -> Self::Scalar {
        let mut buf = [0u8; WIDE_REDUCTION_BYTES];
        rng.fill_bytes(&mut buf);
        let scalar = Scalar(Fr::from_le_bytes_mod_order(&buf));
        buf.zeroize();
        scalar
    }

    fn scalar_mul(element: &Self::Element, scalar: &Self::Scalar) -> Self::Element {
        Element(element.0 * scalar.0)
    }

    fn element_add(a: &Self::Element, b: &Self::Element) -> Self::Element {
        Element(a.0 + b.0)
    }

    fn element_neg(e: &Self::Element) -> Self::Element {
        Element(-e.0)
    }

    fn identity() -> Self::Element {
        Element(EdwardsProjective::zero())
    }

    fn is_identity(element: &Self::Element) -> bool {
        element.0.is_zero()
    }

    fn scalar_from_u64(v: u64) -> Self::Scalar {
        Scalar(Fr::from(v))
    }

    fn scalar_add(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar {
        Scalar(a.0 + b.0)
    }

    fn scalar_sub(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar {
        Scalar(a.0 - b.0)
    }

    fn scalar_mul_scalar(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar {
        Scalar(a.0 * b.0)
    }
}
