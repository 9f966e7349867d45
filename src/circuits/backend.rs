//! The external zk-SNARK proving backend.
//!
//! The backend is a black box: it turns a circuit plus an argument map into
//! a proof with its public signals, and checks such a pair. Real deployments
//! plug in a Groth16 prover; tests use [`MockBackend`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::CircuitArtifacts;
use super::inputs::CircuitArgs;
use crate::Result;

/// A proof and its public signals, as produced by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitProof {
    /// Opaque proof object.
    pub proof: serde_json::Value,
    /// Public signals as decimal strings.
    pub public_signals: Vec<String>,
}

/// Proof generation and verification for named circuits.
#[async_trait]
pub trait ProvingBackend: Send + Sync {
    /// Generates a proof for `circuit` from `args`.
    async fn prove(&self, circuit: &CircuitArtifacts, args: &CircuitArgs) -> Result<CircuitProof>;

    /// Checks `proof` against the verification key of `circuit`.
    ///
    /// `Ok(false)` means the proof is invalid; `Err` means the check could not
    /// be carried out.
    async fn verify(&self, circuit: &CircuitArtifacts, proof: &CircuitProof) -> Result<bool>;
}

#[cfg(feature = "mock")]
pub use mock::MockBackend;

#[cfg(feature = "mock")]
mod mock {
    //! Transparent stand-in for the Groth16 backend.
    //!
    //! `prove` checks the relations the real circuits enforce on their
    //! private inputs where that is cheap, lays out the public signals exactly
    //! like the circuits do, and returns `SHA256(circuit ‖ signals)` as the
    //! proof. `verify` recomputes the digest. Provides no zero knowledge.

    use async_trait::async_trait;
    use serde_json::json;
    use sha2::{Digest, Sha256};

    use super::{CircuitProof, ProvingBackend};
    use crate::circuits::config::{CircuitArtifacts, CircuitConfig};
    use crate::circuits::inputs::CircuitArgs;
    use crate::circuits::registry::{
        hash_point_to_scalar, join_hub_message, AdminAddress, BabyJubSignature, HubRegistry,
        PublicKey,
    };
    use crate::primitives::groups::baby_jubjub::{Element, Scalar};
    use crate::primitives::{ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs};
    use crate::{BabyJubJub, Error, Group, Result};

    const PROOF_OF_SMP_PUBLIC: &[&str] = &[
        "pubkeyC",
        "adminAddress",
        "merkleRoot",
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

    const PROOF_SUCCESSFUL_SMP_PUBLIC: &[&str] = &["pubkeyA", "pa", "ph", "rh"];

    #[derive(Clone, Copy)]
    enum Circuit {
        ProofOfSmp,
        ProofSuccessfulSmp,
    }

    /// Deterministic backend for tests and local development.
    #[derive(Clone, Debug)]
    pub struct MockBackend {
        proof_of_smp: String,
        proof_successful_smp: String,
    }

    impl MockBackend {
        /// Creates a backend recognising the circuits named in `config`.
        pub fn new(config: &CircuitConfig) -> Self {
            Self {
                proof_of_smp: config.proof_of_smp.clone(),
                proof_successful_smp: config.proof_successful_smp.clone(),
            }
        }

        fn circuit(&self, artifacts: &CircuitArtifacts) -> Result<Circuit> {
            if artifacts.name == self.proof_of_smp {
                Ok(Circuit::ProofOfSmp)
            } else if artifacts.name == self.proof_successful_smp {
                Ok(Circuit::ProofSuccessfulSmp)
            } else {
                Err(Error::Backend(format!("unknown circuit {:?}", artifacts.name)))
            }
        }

        fn digest(name: &str, signals: &[String]) -> String {
            let mut hasher = Sha256::new();
            hasher.update(name.as_bytes());
            for signal in signals {
                hasher.update([0u8]);
                hasher.update(signal.as_bytes());
            }
            hex::encode(hasher.finalize())
        }
    }

    fn witness_error(e: Error) -> Error {
        Error::Backend(format!("witness does not satisfy the circuit: {e}"))
    }

    fn signature(args: &CircuitArgs, prefix: &str) -> Result<BabyJubSignature> {
        let r8 = args.require(&format!("{prefix}R8"))?.as_point()?;
        let s = Scalar::from_biguint(&args.require(&format!("{prefix}S"))?.as_biguint()?)?;
        Ok(BabyJubSignature::new(r8, s))
    }

    fn scalar(args: &CircuitArgs, key: &str) -> Result<Scalar> {
        Scalar::from_biguint(&args.require(key)?.as_biguint()?)
    }

    fn point(args: &CircuitArgs, key: &str) -> Result<Element> {
        args.require(key)?.as_point()
    }

    /// `{prefix}` is `x * g1` and its DL proof verifies under `version`.
    fn check_dl(args: &CircuitArgs, prefix: &str, version: u8) -> Result<Element> {
        let y = point(args, prefix)?;
        ProofDiscreteLog::<BabyJubJub>::new(
            scalar(args, &format!("{prefix}ProofC"))?,
            scalar(args, &format!("{prefix}ProofD"))?,
        )
        .verify(version, &BabyJubJub::generator(), &y)?;
        Ok(y)
    }

    fn check_edc(
        args: &CircuitArgs,
        prefix: &str,
        version: u8,
        bases: (&Element, &Element, &Element),
        statement: (&Element, &Element),
    ) -> Result<()> {
        ProofEqualDiscreteCoordinates::<BabyJubJub>::new(
            scalar(args, &format!("{prefix}ProofC"))?,
            scalar(args, &format!("{prefix}ProofD0"))?,
            scalar(args, &format!("{prefix}ProofD1"))?,
        )
        .verify(version, bases, statement)
    }

    fn require(holds: bool, relation: &str) -> Result<()> {
        if holds {
            Ok(())
        } else {
            Err(Error::ProofInvalid(relation.to_string()))
        }
    }

    /// The hub's side of the transcript, checked the way the circuit does.
    ///
    /// Covers the registry and join signatures, every SMP proof up to
    /// message 3, and the hub's exponents against its public shares.
    fn check_proof_of_smp(args: &CircuitArgs) -> Result<()> {
        let pubkey_hub = PublicKey::new(point(args, "pubkeyHub")?);
        let pubkey_c = PublicKey::new(point(args, "pubkeyC")?);
        let registry = HubRegistry::new(
            pubkey_hub,
            signature(args, "sigHubRegistry")?,
            AdminAddress::new(args.require("adminAddress")?.as_biguint()?)?,
        );
        require(registry.verify(), "hub registry signature")?;

        let join = join_hub_message(&pubkey_c, &pubkey_hub);
        signature(args, "sigC")?.verify(pubkey_c.element(), &join)?;
        signature(args, "sigJoinMsgHub")?.verify(pubkey_hub.element(), &join)?;

        let g1 = BabyJubJub::generator();
        let (h2, h3, r4h) = (scalar(args, "h2")?, scalar(args, "h3")?, scalar(args, "r4h")?);

        let g2h = check_dl(args, "g2h", 1)?;
        let g3h = check_dl(args, "g3h", 2)?;
        let g2a = check_dl(args, "g2a", 3)?;
        let g3a = check_dl(args, "g3a", 4)?;
        require(BabyJubJub::scalar_mul(&g1, &h2) == g2h, "g2h = h2 * g1")?;
        require(BabyJubJub::scalar_mul(&g1, &h3) == g3h, "g3h = h3 * g1")?;

        let g2 = BabyJubJub::scalar_mul(&g2a, &h2);
        let g3 = BabyJubJub::scalar_mul(&g3a, &h3);
        let (pa, qa) = (point(args, "pa")?, point(args, "qa")?);
        let (ph, qh) = (point(args, "ph")?, point(args, "qh")?);
        check_edc(args, "paqa", 5, (&g3, &g1, &g2), (&pa, &qa))?;
        check_edc(args, "phqh", 6, (&g3, &g1, &g2), (&ph, &qh))?;
        require(BabyJubJub::scalar_mul(&g3, &r4h) == ph, "ph = r4h * g3")?;

        let qh_qa = BabyJubJub::element_sub(&qh, &qa);
        let rh = point(args, "rh")?;
        ProofEqualDiscreteLogs::<BabyJubJub>::new(scalar(args, "rhProofC")?, scalar(args, "rhProofD")?)
            .verify(7, (&g1, &qh_qa), (&g3h, &rh))?;
        require(BabyJubJub::scalar_mul(&qh_qa, &h3) == rh, "rh = h3 * (qh - qa)")
    }

    /// `a3 * rh == ph - pa` and `sigRh` signs `H(rh)` under `pubkeyA`.
    fn check_proof_successful_smp(args: &CircuitArgs) -> Result<()> {
        let a3 = Scalar::from_biguint(&args.require("a3")?.as_biguint()?)?;
        let pa = args.require("pa")?.as_point()?;
        let ph = args.require("ph")?.as_point()?;
        let rh = args.require("rh")?.as_point()?;
        let pubkey_a = args.require("pubkeyA")?.as_point()?;

        if BabyJubJub::scalar_mul(&rh, &a3) != BabyJubJub::element_sub(&ph, &pa) {
            return Err(Error::ProofInvalid("SMP did not succeed".to_string()));
        }
        signature(args, "sigRh")?.verify(&pubkey_a, &hash_point_to_scalar(&rh))
    }

    #[async_trait]
    impl ProvingBackend for MockBackend {
        async fn prove(
            &self,
            artifacts: &CircuitArtifacts,
            args: &CircuitArgs,
        ) -> Result<CircuitProof> {
            let circuit = self.circuit(artifacts)?;
            let public = match circuit {
                Circuit::ProofOfSmp => {
                    for key in crate::circuits::inputs::PROOF_OF_SMP_KEYS {
                        args.require(key).map_err(witness_error)?;
                    }
                    check_proof_of_smp(args).map_err(witness_error)?;
                    PROOF_OF_SMP_PUBLIC
                }
                Circuit::ProofSuccessfulSmp => {
                    check_proof_successful_smp(args).map_err(witness_error)?;
                    PROOF_SUCCESSFUL_SMP_PUBLIC
                }
            };

            let mut signals = vec!["1".to_string()];
            for key in public {
                args.require(key)
                    .map_err(witness_error)?
                    .flatten_into(&mut signals);
            }
            let digest = Self::digest(&artifacts.name, &signals);
            Ok(CircuitProof {
                proof: json!({
                    "protocol": "mock",
                    "circuit": artifacts.name,
                    "digest": digest,
                }),
                public_signals: signals,
            })
        }

        async fn verify(&self, artifacts: &CircuitArtifacts, proof: &CircuitProof) -> Result<bool> {
            self.circuit(artifacts)?;
            let expected = Self::digest(&artifacts.name, &proof.public_signals);
            Ok(proof.proof.get("circuit").and_then(|v| v.as_str()) == Some(artifacts.name.as_str())
                && proof.proof.get("digest").and_then(|v| v.as_str()) == Some(expected.as_str()))
        }
    }
}
