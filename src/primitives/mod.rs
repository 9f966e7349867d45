//! Cryptographic building blocks of the SMP engine.
//!
//! - **crypto**: the [`Group`] trait
//! - **groups**: concrete groups (Baby Jubjub)
//! - **rng**: secure randomness
//! - **gadgets**: the three Schnorr-style zero-knowledge proofs
//! - **signature**: Schnorr signatures over scalar messages
//! - **transcript**: domain-separated hash-to-scalar

/// Group trait.
pub mod crypto;
/// Zero-knowledge proofs used by the SMP messages.
pub mod gadgets;
/// Group implementations.
pub mod groups;
/// Cryptographically secure random number generation.
pub mod rng;
/// Schnorr signatures.
pub mod signature;
/// Fiat-Shamir transcript and hash-to-scalar.
pub mod transcript;

pub use crypto::Group;
pub use gadgets::{ProofDiscreteLog, ProofEqualDiscreteCoordinates, ProofEqualDiscreteLogs};
pub use groups::BabyJubJub;
pub use rng::SecureRng;
pub use signature::{Keypair, Signature};
pub use transcript::{hash_elements, Transcript};
