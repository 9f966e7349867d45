//! Comparison secrets and their normalization to a scalar.

use num_bigint::BigUint;
use sha2::{Digest, Sha512};

use crate::Group;

const SECRET_DOMAIN: &[u8] = b"blind-find/smp-secret";

/// A secret compared by the SMP, in any of its accepted input forms.
///
/// The forms are domain separated: the integer `1`, the text `"1"` and the
/// byte string `[1]` are different secrets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Secret {
    /// A non-negative integer.
    Integer(BigUint),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Secret {
    fn tag(&self) -> u8 {
        match self {
            Secret::Integer(_) => 0,
            Secret::Text(_) => 1,
            Secret::Bytes(_) => 2,
        }
    }

    /// Hashes the secret to a scalar of `G`.
    pub fn to_scalar<G: Group>(&self) -> G::Scalar {
        let mut hasher = Sha512::new();
        hasher.update(SECRET_DOMAIN);
        hasher.update([self.tag()]);
        match self {
            Secret::Integer(v) => hasher.update(v.to_bytes_be()),
            Secret::Text(s) => hasher.update(s.as_bytes()),
            Secret::Bytes(b) => hasher.update(b),
        }
        G::scalar_from_bytes_mod_order(&hasher.finalize())
    }
}

impl From<u64> for Secret {
    fn from(v: u64) -> Self {
        Secret::Integer(BigUint::from(v))
    }
}

impl From<BigUint> for Secret {
    fn from(v: BigUint) -> Self {
        Secret::Integer(v)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Secret::Text(s.to_string())
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Secret::Text(s)
    }
}

impl From<&[u8]> for Secret {
    fn from(b: &[u8]) -> Self {
        Secret::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Secret {
    fn from(b: Vec<u8>) -> Self {
        Secret::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BabyJubJub;

    #[test]
    fn normalization_is_deterministic() {
        let a = Secret::from("string0").to_scalar::<BabyJubJub>();
        let b = Secret::from(String::from("string0")).to_scalar::<BabyJubJub>();
        assert_eq!(a, b);
    }

    #[test]
    fn forms_are_separated() {
        let int = Secret::from(1u64).to_scalar::<BabyJubJub>();
        let text = Secret::from("1").to_scalar::<BabyJubJub>();
        let bytes = Secret::from(vec![1u8]).to_scalar::<BabyJubJub>();
        assert_ne!(int, text);
        assert_ne!(int, bytes);
        assert_ne!(text, bytes);
    }
}
