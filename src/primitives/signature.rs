//! Schnorr signatures over a [`Group`].
//!
//! A signature on a scalar message `m` is the pair `(R8, S)` with
//! `R8 = r * g`, `h = H(R8, pk, m)` and `S = r + h * sk`. Verification checks
//! `S * g == R8 + h * pk`. Hub registrations, join messages and the searcher's
//! signature over `rh` all use this scheme.

use rand_core::CryptoRngCore;

use super::transcript::Transcript;
use crate::{Error, Group, Result};

const SIGNATURE_DOMAIN: &[u8] = b"schnorr-signature";

/// A private/public key pair.
#[derive(Clone)]
pub struct Keypair<G: Group> {
    secret: G::Scalar,
    public: G::Element,
}

impl<G: Group> core::fmt::Debug for Keypair<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl<G: Group> Keypair<G> {
    /// Generates a fresh key pair.
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        Self::from_secret(G::random_scalar(rng))
    }

    /// Derives the key pair for an existing private key.
    pub fn from_secret(secret: G::Scalar) -> Self {
        let public = G::scalar_mul(&G::generator(), &secret);
        Self { secret, public }
    }

    /// Returns the public key.
    pub fn public(&self) -> &G::Element {
        &self.public
    }

    /// Signs a scalar message.
    pub fn sign<R: CryptoRngCore>(&self, message: &G::Scalar, rng: &mut R) -> Signature<G> {
        let r = G::random_scalar(rng);
        let r8 = G::scalar_mul(&G::generator(), &r);
        let h = challenge::<G>(&r8, &self.public, message);
        let s = G::scalar_add(&r, &G::scalar_mul_scalar(&h, &self.secret));
        Signature { r8, s }
    }
}

/// A Schnorr signature `(R8, S)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature<G: Group> {
    r8: G::Element,
    s: G::Scalar,
}

impl<G: Group> Signature<G> {
    /// Creates a signature from its components.
    pub fn new(r8: G::Element, s: G::Scalar) -> Self {
        Self { r8, s }
    }

    /// Returns the commitment point `R8`.
    pub fn r8(&self) -> &G::Element {
        &self.r8
    }

    /// Returns the response scalar `S`.
    pub fn s(&self) -> &G::Scalar {
        &self.s
    }

    /// Verifies the signature for `message` under `public`.
    pub fn verify(&self, public: &G::Element, message: &G::Scalar) -> Result<()> {
        let h = challenge::<G>(&self.r8, public, message);
        let lhs = G::scalar_mul(&G::generator(), &self.s);
        let rhs = G::element_add(&self.r8, &G::scalar_mul(public, &h));
        if lhs != rhs {
            return Err(Error::ProofInvalid("signature does not verify".to_string()));
        }
        Ok(())
    }
}

fn challenge<G: Group>(r8: &G::Element, public: &G::Element, message: &G::Scalar) -> G::Scalar {
    let mut transcript = Transcript::with_domain(SIGNATURE_DOMAIN);
    transcript.append_group_name(G::name());
    transcript.append_element::<G>(b"R8", r8);
    transcript.append_element::<G>(b"pubkey", public);
    transcript.append_scalar::<G>(b"message", message);
    transcript.challenge_scalar::<G>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BabyJubJub, SecureRng};

    type G = BabyJubJub;

    #[test]
    fn sign_and_verify() {
        let mut rng = SecureRng::new();
        let keypair = Keypair::<G>::generate(&mut rng);
        let message = G::scalar_from_u64(42);

        let sig = keypair.sign(&message, &mut rng);
        assert!(sig.verify(keypair.public(), &message).is_ok());
    }

    #[test]
    fn rejects_other_message_or_key() {
        let mut rng = SecureRng::new();
        let keypair = Keypair::<G>::generate(&mut rng);
        let other = Keypair::<G>::generate(&mut rng);
        let message = G::scalar_from_u64(42);

        let sig = keypair.sign(&message, &mut rng);
        assert!(sig.verify(keypair.public(), &G::scalar_from_u64(43)).is_err());
        assert!(sig.verify(other.public(), &message).is_err());
    }

    #[test]
    fn rejects_tampered_response() {
        let mut rng = SecureRng::new();
        let keypair = Keypair::<G>::generate(&mut rng);
        let message = G::scalar_from_u64(7);

        let sig = keypair.sign(&message, &mut rng);
        let forged = Signature::<G>::new(
            sig.r8().clone(),
            G::scalar_add(sig.s(), &G::scalar_from_u64(1)),
        );
        assert!(matches!(
            forged.verify(keypair.public(), &message),
            Err(Error::ProofInvalid(_))
        ));
    }
}
