use core::fmt::Debug;

use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::Result;

/// Trait for the prime-order groups the SMP engine runs over.
///
/// Elements are written additively: `element_add` is the group operation and
/// `scalar_mul` is repeated addition. Every scalar and element has a fixed-width
/// canonical encoding so that SMP messages have a bit-exact wire format.
pub trait Group: Clone + Debug + PartialEq + Eq + Send + Sync + 'static {
    /// Scalar type for this group (integers modulo the subgroup order).
    ///
    /// Scalars must be zeroizable since they carry secrets and exponents.
    type Scalar: Clone
        + Debug
        + Eq
        + PartialEq
        + Zeroize
        + Serialize
        + for<'de> Deserialize<'de>
        + Send
        + Sync;

    /// Element type for this group (points of the prime-order subgroup).
    type Element: Clone
        + Debug
        + Eq
        + PartialEq
        + Serialize
        + for<'de> Deserialize<'de>
        + Send
        + Sync;

    /// Width in bytes of an encoded scalar.
    const SCALAR_BYTES: usize;

    /// Width in bytes of an encoded element.
    const ELEMENT_BYTES: usize;

    /// Returns the name of this group implementation.
    fn name() -> &'static str;

    /// Returns the base point `g1` of the prime-order subgroup.
    fn generator() -> Self::Element;

    /// Deserializes a scalar from exactly [`Group::SCALAR_BYTES`] bytes.
    ///
    /// Values not below the subgroup order are rejected.
    fn scalar_from_bytes(b: &[u8]) -> Result<Self::Scalar>;

    /// Serializes a scalar to exactly [`Group::SCALAR_BYTES`] bytes.
    fn scalar_to_bytes(s: &Self::Scalar) -> Vec<u8>;

    /// Reduces arbitrary bytes (little-endian) modulo the subgroup order.
    fn scalar_from_bytes_mod_order(b: &[u8]) -> Self::Scalar;

    /// Deserializes an element from exactly [`Group::ELEMENT_BYTES`] bytes.
    ///
    /// Fails unless the bytes decode to a point of the prime-order subgroup.
    fn element_from_bytes(b: &[u8]) -> Result<Self::Element>;

    /// Serializes an element to exactly [`Group::ELEMENT_BYTES`] bytes.
    fn element_to_bytes(e: &Self::Element) -> Vec<u8>;

    /// Generates a uniformly random scalar using the provided RNG.
    fn random_scalar<R: CryptoRngCore>(rng: &mut R) -> Self::Scalar;

    /// Performs scalar multiplication: `scalar * element`.
    fn scalar_mul(e: &Self::Element, s: &Self::Scalar) -> Self::Element;

    /// Applies the group operation: `a + b`.
    fn element_add(a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Returns the inverse element: `-e`.
    fn element_neg(e: &Self::Element) -> Self::Element;

    /// Returns `a - b`.
    fn element_sub(a: &Self::Element, b: &Self::Element) -> Self::Element {
        Self::element_add(a, &Self::element_neg(b))
    }

    /// Returns the identity element of the group.
    fn identity() -> Self::Element;

    /// Checks if an element is the identity.
    fn is_identity(element: &Self::Element) -> bool;

    /// Builds a scalar from a small integer.
    fn scalar_from_u64(v: u64) -> Self::Scalar;

    /// Adds two scalars: `a + b`.
    fn scalar_add(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Subtracts two scalars: `a - b`, normalized into `[0, n)`.
    fn scalar_sub(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Multiplies two scalars: `a * b`.
    fn scalar_mul_scalar(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;
}
