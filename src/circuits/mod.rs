//! Proof composition: SMP transcripts in, zk-SNARK proofs of indirect
//! connection out.
//!
//! The hub proves with a proof of SMP that it ran the protocol with the
//! searcher on behalf of a registered target. The searcher proves with a
//! proof of successful SMP that the run matched. A verifier accepts the pair
//! only if both proofs verify and their public signals agree.

/// Proving backend trait and mock implementation.
pub mod backend;
/// Circuit identifiers and artifact locations.
pub mod config;
/// Argument-map builders.
pub mod inputs;
/// Keys, hub registrations and Merkle witnesses.
pub mod registry;
/// Public-signal parsers.
pub mod signals;

use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;

use metrics::{counter, histogram};
use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use backend::{CircuitProof, ProvingBackend};
#[cfg(feature = "mock")]
pub use backend::MockBackend;
pub use config::{CircuitArtifacts, CircuitConfig};
pub use inputs::{
    proof_of_smp_args, proof_successful_smp_args, CircuitArg, CircuitArgs, ProofOfSmpInput,
    ProofSuccessfulSmpInput,
};
pub use registry::{
    hash_point_to_scalar, join_hub_message, AdminAddress, BabyJubKeypair, BabyJubSignature,
    HubRegistry, MerkleProof, PublicKey,
};
pub use signals::{
    parse_proof_of_smp_signals, parse_proof_successful_smp_signals, ProofOfSmpSignals,
    ProofSuccessfulSmpSignals,
};

use crate::primitives::groups::baby_jubjub::{Element, Scalar};
use crate::protocol::{SmpMessage2, SmpMessage3, SmpStateMachine};
use crate::{BabyJubJub, Error, Result};

/// The composite proof a searcher hands to any verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofIndirectConnection {
    /// The searcher.
    pub pubkey_a: PublicKey,
    /// The target reached through the hub.
    pub pubkey_c: PublicKey,
    /// Admin of the registry the hub belongs to.
    pub admin_address: AdminAddress,
    /// Produced by the hub.
    #[serde(rename = "proofOfSMP")]
    pub proof_of_smp: CircuitProof,
    /// Produced by the searcher.
    #[serde(rename = "proofSuccessfulSMP")]
    pub proof_successful_smp: CircuitProof,
}

/// What the searcher holds after an SMP with a hub that matched the target.
#[derive(Clone, Debug)]
pub struct SearchResult {
    /// The hub's proof of SMP.
    pub proof_of_smp: CircuitProof,
    /// Searcher's `g3` exponent.
    pub a3: Scalar,
    /// Searcher's `P`.
    pub pa: Element,
    /// Hub's `P`.
    pub ph: Element,
    /// Hub's `R`.
    pub rh: Element,
}

impl SearchResult {
    /// Collects the searcher's values from its finished session.
    ///
    /// `msg2` is the message the searcher sent and `msg3` the one it received.
    pub fn from_session(
        proof_of_smp: CircuitProof,
        session: &SmpStateMachine<BabyJubJub>,
        msg2: &SmpMessage2<BabyJubJub>,
        msg3: &SmpMessage3<BabyJubJub>,
    ) -> Result<Self> {
        let a3 = session.ephemeral().a3().cloned().ok_or_else(|| {
            Error::MalformedInput("session has not generated its DH exponents".to_string())
        })?;
        Ok(Self {
            proof_of_smp,
            a3,
            pa: msg2.pb,
            ph: msg3.pa,
            rh: msg3.ra,
        })
    }
}

/// Generates and verifies proofs of indirect connection through a backend.
pub struct ProofComposer<B: ProvingBackend> {
    backend: B,
    config: CircuitConfig,
}

impl<B: ProvingBackend> ProofComposer<B> {
    /// Creates a composer after validating `config`.
    pub fn new(backend: B, config: CircuitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// The active configuration.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.config.timeout();
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    async fn prove(&self, artifacts: CircuitArtifacts, args: CircuitArgs) -> Result<CircuitProof> {
        let start = Instant::now();
        counter!("proof.generate.requests", "circuit" => artifacts.name.clone()).increment(1);
        let result = self.bounded(self.backend.prove(&artifacts, &args)).await;
        histogram!("proof.generate.duration", "circuit" => artifacts.name.clone())
            .record(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => debug!(circuit = %artifacts.name, "proof generated"),
            Err(e) => warn!(circuit = %artifacts.name, error = %e, "proof generation failed"),
        }
        result
    }

    /// Hub side: proves the SMP transcript and registry membership.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedInput`] if the hub registry does not verify, or any
    /// backend error.
    pub async fn gen_proof_of_smp(&self, input: &ProofOfSmpInput) -> Result<CircuitProof> {
        let args = proof_of_smp_args(input)?;
        self.prove(self.config.proof_of_smp_artifacts(), args).await
    }

    /// Checks a proof of SMP with the backend.
    pub async fn verify_proof_of_smp(&self, proof: &CircuitProof) -> Result<bool> {
        let artifacts = self.config.proof_of_smp_artifacts();
        self.bounded(self.backend.verify(&artifacts, proof)).await
    }

    /// Searcher side: proves the SMP succeeded.
    pub async fn gen_proof_successful_smp(
        &self,
        input: &ProofSuccessfulSmpInput,
    ) -> Result<CircuitProof> {
        let args = proof_successful_smp_args(input);
        self.prove(self.config.proof_successful_smp_artifacts(), args)
            .await
    }

    /// Checks a proof of successful SMP with the backend.
    pub async fn verify_proof_successful_smp(&self, proof: &CircuitProof) -> Result<bool> {
        let artifacts = self.config.proof_successful_smp_artifacts();
        self.bounded(self.backend.verify(&artifacts, proof)).await
    }

    /// Verifies a composite proof against the currently valid Merkle roots.
    ///
    /// Returns `Ok(false)` for any forged or mismatched proof.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedInput`] if a proof the backend accepted carries
    /// public signals that do not parse; backend failures as returned.
    pub async fn verify_proof_indirect_connection(
        &self,
        proof: &ProofIndirectConnection,
        valid_roots: &HashSet<BigUint>,
    ) -> Result<bool> {
        let start = Instant::now();
        counter!("indirect_connection.verify.requests").increment(1);
        let result = self.check_indirect_connection(proof, valid_roots).await;
        histogram!("indirect_connection.verify.duration").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(true) => {
                counter!("indirect_connection.verify.success").increment(1);
                info!("proof of indirect connection verified");
            }
            Ok(false) => {
                counter!("indirect_connection.verify.failure").increment(1);
            }
            Err(e) => {
                counter!("indirect_connection.verify.failure").increment(1);
                warn!(error = %e, "could not verify proof of indirect connection");
            }
        }
        result
    }

    async fn check_indirect_connection(
        &self,
        proof: &ProofIndirectConnection,
        valid_roots: &HashSet<BigUint>,
    ) -> Result<bool> {
        if !self.verify_proof_of_smp(&proof.proof_of_smp).await? {
            warn!("proof of SMP rejected by backend");
            return Ok(false);
        }
        let smp = parse_proof_of_smp_signals(&proof.proof_of_smp.public_signals)?;

        if !self
            .verify_proof_successful_smp(&proof.proof_successful_smp)
            .await?
        {
            warn!("proof of successful SMP rejected by backend");
            return Ok(false);
        }
        let successful =
            parse_proof_successful_smp_signals(&proof.proof_successful_smp.public_signals)?;

        let checks = [
            ("pubkeyA", successful.pubkey_a == proof.pubkey_a.coordinates()),
            ("pubkeyC", smp.pubkey_c == proof.pubkey_c.coordinates()),
            ("adminAddress", &smp.admin_address == proof.admin_address.value()),
            ("merkleRoot", valid_roots.contains(&smp.merkle_root)),
            ("pa", smp.pa == successful.pa),
            ("ph", smp.ph == successful.ph),
            ("rh", smp.rh == successful.rh),
        ];
        if let Some((name, _)) = checks.iter().find(|(_, ok)| !ok) {
            warn!(check = *name, "proof of indirect connection mismatch");
            return Ok(false);
        }
        Ok(true)
    }

    /// Searcher side: turns a hub's answer into a proof of indirect connection.
    ///
    /// Verifies the hub's proof of SMP, signs `H(rh)`, proves the SMP
    /// succeeded and checks the assembled proof against `merkle_root`.
    ///
    /// # Errors
    ///
    /// [`Error::ProofInvalid`] if the hub's proof or the assembled proof does
    /// not verify; backend errors otherwise.
    pub async fn prove_indirect_connection<R: CryptoRngCore + Send>(
        &self,
        result: &SearchResult,
        keypair: &BabyJubKeypair,
        target: &PublicKey,
        admin_address: &AdminAddress,
        merkle_root: &BigUint,
        rng: &mut R,
    ) -> Result<ProofIndirectConnection> {
        if !self.verify_proof_of_smp(&result.proof_of_smp).await? {
            return Err(Error::ProofInvalid("proof of smp is invalid".to_string()));
        }

        let sig_rh = keypair.sign(&hash_point_to_scalar(&result.rh), rng);
        let input = ProofSuccessfulSmpInput {
            a3: result.a3.clone(),
            pa: result.pa,
            ph: result.ph,
            rh: result.rh,
            pubkey_a: PublicKey::from(keypair),
            sig_rh,
        };
        let proof_successful_smp = self.gen_proof_successful_smp(&input).await?;

        let proof = ProofIndirectConnection {
            pubkey_a: PublicKey::from(keypair),
            pubkey_c: *target,
            admin_address: admin_address.clone(),
            proof_of_smp: result.proof_of_smp.clone(),
            proof_successful_smp,
        };
        let roots = HashSet::from([merkle_root.clone()]);
        if !self.verify_proof_indirect_connection(&proof, &roots).await? {
            return Err(Error::ProofInvalid(
                "proof of indirect connection is invalid".to_string(),
            ));
        }
        Ok(proof)
    }
}
