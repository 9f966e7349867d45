//! Schnorr-style zero-knowledge proofs used by the SMP.
//!
//! Three proof kinds, each a single Fiat-Shamir challenge `c` plus one or two
//! responses `d = r - c * x (mod n)`:
//!
//! - [`ProofDiscreteLog`]: knowledge of `x` with `y = x * g`.
//! - [`ProofEqualDiscreteLogs`]: `y0 = x * g0` and `y1 = x * g1` share `x`.
//! - [`ProofEqualDiscreteCoordinates`]: `y0 = x0 * g0` and
//!   `y1 = x0 * g1 + x1 * g2` were built from the same `x0`.
//!
//! Challenges are computed with the versioned hash in [`crate::primitives::transcript`]
//! over the bases, the statement and the reconstructed commitments.

use rand_core::CryptoRngCore;

use super::transcript::hash_elements;
use crate::{Error, Group, Result};

/// Proof of knowledge of a discrete logarithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofDiscreteLog<G: Group> {
    c: G::Scalar,
    d: G::Scalar,
}

impl<G: Group> ProofDiscreteLog<G> {
    /// Creates a proof from its challenge and response.
    pub fn new(c: G::Scalar, d: G::Scalar) -> Self {
        Self { c, d }
    }

    /// Proves knowledge of `x` such that `y = x * g`.
    ///
    /// The caller passes the already computed statement `y`.
    pub fn prove<R: CryptoRngCore>(
        version: u8,
        g: &G::Element,
        y: &G::Element,
        x: &G::Scalar,
        rng: &mut R,
    ) -> Self {
        let r = G::random_scalar(rng);
        let commitment = G::scalar_mul(g, &r);
        let c = hash_elements::<G>(version, &[g, y, &commitment]);
        let d = G::scalar_sub(&r, &G::scalar_mul_scalar(&c, x));
        Self { c, d }
    }

    /// Verifies the proof against base `g` and statement `y`.
    pub fn verify(&self, version: u8, g: &G::Element, y: &G::Element) -> Result<()> {
        let commitment = G::element_add(&G::scalar_mul(g, &self.d), &G::scalar_mul(y, &self.c));
        let expected = hash_elements::<G>(version, &[g, y, &commitment]);
        if expected != self.c {
            return Err(Error::ProofInvalid(format!(
                "discrete log proof (version {version}) does not verify"
            )));
        }
        Ok(())
    }

    /// Returns the challenge `c`.
    pub fn c(&self) -> &G::Scalar {
        &self.c
    }

    /// Returns the response `d`.
    pub fn d(&self) -> &G::Scalar {
        &self.d
    }
}

/// Proof that two elements share a discrete logarithm relative to two bases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofEqualDiscreteLogs<G: Group> {
    c: G::Scalar,
    d: G::Scalar,
}

impl<G: Group> ProofEqualDiscreteLogs<G> {
    /// Creates a proof from its challenge and response.
    pub fn new(c: G::Scalar, d: G::Scalar) -> Self {
        Self { c, d }
    }

    /// Proves `y0 = x * g0` and `y1 = x * g1`.
    pub fn prove<R: CryptoRngCore>(
        version: u8,
        bases: (&G::Element, &G::Element),
        statement: (&G::Element, &G::Element),
        x: &G::Scalar,
        rng: &mut R,
    ) -> Self {
        let (g0, g1) = bases;
        let (y0, y1) = statement;
        let r = G::random_scalar(rng);
        let a0 = G::scalar_mul(g0, &r);
        let a1 = G::scalar_mul(g1, &r);
        let c = hash_elements::<G>(version, &[g0, g1, y0, y1, &a0, &a1]);
        let d = G::scalar_sub(&r, &G::scalar_mul_scalar(&c, x));
        Self { c, d }
    }

    /// Verifies the proof against both bases simultaneously.
    pub fn verify(
        &self,
        version: u8,
        bases: (&G::Element, &G::Element),
        statement: (&G::Element, &G::Element),
    ) -> Result<()> {
        let (g0, g1) = bases;
        let (y0, y1) = statement;
        let a0 = G::element_add(&G::scalar_mul(g0, &self.d), &G::scalar_mul(y0, &self.c));
        let a1 = G::element_add(&G::scalar_mul(g1, &self.d), &G::scalar_mul(y1, &self.c));
        let expected = hash_elements::<G>(version, &[g0, g1, y0, y1, &a0, &a1]);
        if expected != self.c {
            return Err(Error::ProofInvalid(format!(
                "equal discrete logs proof (version {version}) does not verify"
            )));
        }
        Ok(())
    }

    /// Returns the challenge `c`.
    pub fn c(&self) -> &G::Scalar {
        &self.c
    }

    /// Returns the response `d`.
    pub fn d(&self) -> &G::Scalar {
        &self.d
    }
}

/// Proof that a pair `(P, Q)` was derived as `P = x0 * g0`, `Q = x0 * g1 + x1 * g2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofEqualDiscreteCoordinates<G: Group> {
    c: G::Scalar,
    d0: G::Scalar,
    d1: G::Scalar,
}

impl<G: Group> ProofEqualDiscreteCoordinates<G> {
    /// Creates a proof from its challenge and two responses.
    pub fn new(c: G::Scalar, d0: G::Scalar, d1: G::Scalar) -> Self {
        Self { c, d0, d1 }
    }

    /// Proves the pair `(y0, y1)` was derived from exponents `(x0, x1)`.
    pub fn prove<R: CryptoRngCore>(
        version: u8,
        bases: (&G::Element, &G::Element, &G::Element),
        statement: (&G::Element, &G::Element),
        exponents: (&G::Scalar, &G::Scalar),
        rng: &mut R,
    ) -> Self {
        let (g0, g1, g2) = bases;
        let (y0, y1) = statement;
        let (x0, x1) = exponents;
        let r0 = G::random_scalar(rng);
        let r1 = G::random_scalar(rng);
        let a0 = G::scalar_mul(g0, &r0);
        let a1 = G::element_add(&G::scalar_mul(g1, &r0), &G::scalar_mul(g2, &r1));
        let c = hash_elements::<G>(version, &[g0, g1, g2, y0, y1, &a0, &a1]);
        let d0 = G::scalar_sub(&r0, &G::scalar_mul_scalar(&c, x0));
        let d1 = G::scalar_sub(&r1, &G::scalar_mul_scalar(&c, x1));
        Self { c, d0, d1 }
    }

    /// Verifies the proof, reconstructing both commitments from the single challenge.
    pub fn verify(
        &self,
        version: u8,
        bases: (&G::Element, &G::Element, &G::Element),
        statement: (&G::Element, &G::Element),
    ) -> Result<()> {
        let (g0, g1, g2) = bases;
        let (y0, y1) = statement;
        let a0 = G::element_add(&G::scalar_mul(g0, &self.d0), &G::scalar_mul(y0, &self.c));
        let a1 = G::element_add(
            &G::element_add(&G::scalar_mul(g1, &self.d0), &G::scalar_mul(g2, &self.d1)),
            &G::scalar_mul(y1, &self.c),
        );
        let expected = hash_elements::<G>(version, &[g0, g1, g2, y0, y1, &a0, &a1]);
        if expected != self.c {
            return Err(Error::ProofInvalid(format!(
                "equal discrete coordinates proof (version {version}) does not verify"
            )));
        }
        Ok(())
    }

    /// Returns the challenge `c`.
    pub fn c(&self) -> &G::Scalar {
        &self.c
    }

    /// Returns the first response `d0`.
    pub fn d0(&self) -> &G::Scalar {
        &self.d0
    }

    /// Returns the second response `d1`.
    pub fn d1(&self) -> &G::Scalar {
        &self.d1
    }
}
