//! Proof of indirect connection for Blind Find.
//!
//! A searcher and a hub run the Socialist Millionaires' Protocol (SMP) over
//! Baby Jubjub to learn whether the hub serves a given target user, without
//! revealing anything else. On a match the two parties compose a pair of
//! zk-SNARK proofs that any verifier can check against the registry's
//! Merkle roots.
//!
//! - **primitives**: group, Schnorr proofs and signatures, hash-to-scalar
//! - **protocol**: TLV wire format, SMP messages, the per-party state machine
//! - **circuits**: circuit arguments, public signals, proof composition
//!
//! # Example
//!
//! ```
//! use blind_find::SmpStateMachine;
//!
//! let mut alice: SmpStateMachine = SmpStateMachine::new("secret");
//! let mut bob: SmpStateMachine = SmpStateMachine::new("secret");
//!
//! let msg1 = alice.transit(None).unwrap();
//! let msg2 = bob.transit(msg1.as_ref()).unwrap();
//! let msg3 = alice.transit(msg2.as_ref()).unwrap();
//! let msg4 = bob.transit(msg3.as_ref()).unwrap();
//! assert!(alice.transit(msg4.as_ref()).unwrap().is_none());
//!
//! assert!(alice.get_result().unwrap());
//! assert!(bob.get_result().unwrap());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// zk-SNARK proof composition.
pub mod circuits;
/// Error types.
pub mod error;
/// Core cryptographic primitives.
pub mod primitives;
/// The SMP engine.
pub mod protocol;

pub use error::{Error, Result};
pub use primitives::{
    hash_elements, BabyJubJub, Group, Keypair, ProofDiscreteLog, ProofEqualDiscreteCoordinates,
    ProofEqualDiscreteLogs, SecureRng, Signature, Transcript,
};
pub use protocol::{
    Secret, SmpMessage, SmpMessage1, SmpMessage2, SmpMessage3, SmpMessage4, SmpState,
    SmpStateMachine, Stage, StageMessage, Tlv,
};

pub use circuits::{
    CircuitConfig, CircuitProof, ProofComposer, ProofIndirectConnection, ProvingBackend,
    SearchResult,
};
#[cfg(feature = "mock")]
pub use circuits::MockBackend;
