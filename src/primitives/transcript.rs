use merlin::Transcript as MerlinTranscript;

use crate::Group;

/// Protocol label for transcript initialization.
const PROTOCOL_LABEL: &[u8] = b"blind-find SMP v4";

/// Domain separation tag for challenge generation.
const CHALLENGE_DST: &[u8] = b"challenge";

/// Number of bytes squeezed for a challenge before reduction modulo the group order.
const WIDE_REDUCTION_BYTES: usize = 64;

/// Transcript wrapper for the Fiat-Shamir transformation.
///
/// This is the hash-to-scalar function `H` of the protocol. Every use is
/// separated by a version tag, so a challenge computed for one SMP step can
/// never be replayed as the challenge of another.
pub struct Transcript(MerlinTranscript);

impl Transcript {
    /// Creates a new transcript bound to the protocol label.
    pub fn new() -> Self {
        Self(MerlinTranscript::new(PROTOCOL_LABEL))
    }

    /// Creates a transcript for one of the numbered SMP hash uses (1..=8).
    pub fn with_version(version: u8) -> Self {
        let mut transcript = Self::new();
        transcript.0.append_u64(b"version", u64::from(version));
        transcript
    }

    /// Creates a transcript for a named, non-SMP use such as signatures.
    pub fn with_domain(domain: &[u8]) -> Self {
        let mut transcript = Self::new();
        transcript.0.append_message(b"domain", domain);
        transcript
    }

    /// Appends the group name to the transcript.
    pub fn append_group_name(&mut self, name: &str) {
        self.0.append_message(b"group", name.as_bytes());
    }

    /// Appends a group element in its canonical encoding.
    pub fn append_element<G: Group>(&mut self, label: &'static [u8], element: &G::Element) {
        self.0.append_message(label, &G::element_to_bytes(element));
    }

    /// Appends a scalar in its canonical encoding.
    pub fn append_scalar<G: Group>(&mut self, label: &'static [u8], scalar: &G::Scalar) {
        self.0.append_message(label, &G::scalar_to_bytes(scalar));
    }

    /// Appends raw bytes.
    pub fn append_bytes(&mut self, label: &'static [u8], bytes: &[u8]) {
        self.0.append_message(label, bytes);
    }

    /// Squeezes a challenge scalar.
    ///
    /// Uses wide reduction (64 bytes) to keep the distribution uniform modulo `n`.
    pub fn challenge_scalar<G: Group>(&mut self) -> G::Scalar {
        let mut buf = [0u8; WIDE_REDUCTION_BYTES];
        self.0.challenge_bytes(CHALLENGE_DST, &mut buf);
        G::scalar_from_bytes_mod_order(&buf)
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

/// Hashes a list of group elements to a scalar under an SMP version tag.
pub fn hash_elements<G: Group>(version: u8, elements: &[&G::Element]) -> G::Scalar {
    let mut transcript = Transcript::with_version(version);
    transcript.append_group_name(G::name());
    for element in elements {
        transcript.append_element::<G>(b"element", element);
    }
    transcript.challenge_scalar::<G>()
}
