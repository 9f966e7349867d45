//! Public-signal layouts of the two circuits.
//!
//! Signal 0 is always the constant `1` and is ignored.
//!
//! Proof of SMP (39 signals):
//!
//! | Offset | Signal |
//! |---|---|
//! | 1..3 | `pubkeyC` |
//! | 3 | `adminAddress` |
//! | 4 | `merkleRoot` |
//! | 5..21 | `g2h, g3h, g2a, g3a` with their proofs |
//! | 21..23 | `pa` |
//! | 23..28 | `qa`, `(Pa, Qa)` proof |
//! | 28..30 | `ph` |
//! | 30..35 | `qh`, `(Ph, Qh)` proof |
//! | 35..37 | `rh` |
//! | 37..39 | `rh` proof |
//!
//! Proof of successful SMP (9 signals): `pubkeyA` at 1..3, `pa` at 3..5,
//! `ph` at 5..7, `rh` at 7..9.

use num_bigint::BigUint;

use super::registry::parse_decimal;
use crate::primitives::groups::baby_jubjub::Element;
use crate::{Error, Result};

/// Number of public signals of the proof of SMP.
pub const PROOF_OF_SMP_SIGNALS: usize = 39;

/// Number of public signals of the proof of successful SMP.
pub const PROOF_SUCCESSFUL_SMP_SIGNALS: usize = 9;

/// Values exposed by the proof of SMP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofOfSmpSignals {
    /// Target user's key coordinates.
    pub pubkey_c: [BigUint; 2],
    /// Registry admin address.
    pub admin_address: BigUint,
    /// Registry Merkle root.
    pub merkle_root: BigUint,
    /// Searcher's `P`.
    pub pa: Element,
    /// Hub's `P`.
    pub ph: Element,
    /// Hub's `R`.
    pub rh: Element,
}

/// Values exposed by the proof of successful SMP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofSuccessfulSmpSignals {
    /// Searcher's key coordinates.
    pub pubkey_a: [BigUint; 2],
    /// Searcher's `P`.
    pub pa: Element,
    /// Hub's `P`.
    pub ph: Element,
    /// Hub's `R`.
    pub rh: Element,
}

fn parse_all(signals: &[String], expected: usize) -> Result<Vec<BigUint>> {
    if signals.len() != expected {
        return Err(Error::MalformedInput(format!(
            "expected {expected} public signals, got {}",
            signals.len()
        )));
    }
    signals.iter().map(|s| parse_decimal(s)).collect()
}

fn pair(values: &[BigUint], at: usize) -> [BigUint; 2] {
    [values[at].clone(), values[at + 1].clone()]
}

fn point(values: &[BigUint], at: usize) -> Result<Element> {
    Element::from_coordinates(&values[at], &values[at + 1])
}

/// Parses the proof-of-SMP public signals.
///
/// # Errors
///
/// [`Error::MalformedInput`] unless there are exactly 39 decimal signals and
/// the three points decode.
pub fn parse_proof_of_smp_signals(signals: &[String]) -> Result<ProofOfSmpSignals> {
    let values = parse_all(signals, PROOF_OF_SMP_SIGNALS)?;
    Ok(ProofOfSmpSignals {
        pubkey_c: pair(&values, 1),
        admin_address: values[3].clone(),
        merkle_root: values[4].clone(),
        pa: point(&values, 21)?,
        ph: point(&values, 28)?,
        rh: point(&values, 35)?,
    })
}

/// Parses the proof-of-successful-SMP public signals.
///
/// # Errors
///
/// [`Error::MalformedInput`] unless there are exactly 9 decimal signals and
/// the three points decode.
pub fn parse_proof_successful_smp_signals(signals: &[String]) -> Result<ProofSuccessfulSmpSignals> {
    let values = parse_all(signals, PROOF_SUCCESSFUL_SMP_SIGNALS)?;
    Ok(ProofSuccessfulSmpSignals {
        pubkey_a: pair(&values, 1),
        pa: point(&values, 3)?,
        ph: point(&values, 5)?,
        rh: point(&values, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BabyJubJub, Group, SecureRng};

    fn random_point(rng: &mut SecureRng) -> Element {
        BabyJubJub::scalar_mul(&BabyJubJub::generator(), &BabyJubJub::random_scalar(rng))
    }

    fn coords(p: &Element) -> Vec<String> {
        p.coordinates().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn successful_smp_offsets() {
        let mut rng = SecureRng::new();
        let (key, pa, ph, rh) = (
            random_point(&mut rng),
            random_point(&mut rng),
            random_point(&mut rng),
            random_point(&mut rng),
        );
        let mut signals = vec!["1".to_string()];
        for p in [&key, &pa, &ph, &rh] {
            signals.extend(coords(p));
        }

        let parsed = parse_proof_successful_smp_signals(&signals).unwrap();
        assert_eq!(parsed.pubkey_a, key.coordinates());
        assert_eq!((parsed.pa, parsed.ph, parsed.rh), (pa, ph, rh));
    }

    #[test]
    fn proof_of_smp_offsets() {
        let mut rng = SecureRng::new();
        let pa = random_point(&mut rng);
        let ph = random_point(&mut rng);
        let rh = random_point(&mut rng);

        let mut signals = vec!["0".to_string(); PROOF_OF_SMP_SIGNALS];
        signals[0] = "1".to_string();
        signals[1] = "11".to_string();
        signals[2] = "12".to_string();
        signals[3] = "13".to_string();
        signals[4] = "14".to_string();
        signals.splice(21..23, coords(&pa));
        signals.splice(28..30, coords(&ph));
        signals.splice(35..37, coords(&rh));

        let parsed = parse_proof_of_smp_signals(&signals).unwrap();
        assert_eq!(parsed.pubkey_c, [BigUint::from(11u32), BigUint::from(12u32)]);
        assert_eq!(parsed.admin_address, BigUint::from(13u32));
        assert_eq!(parsed.merkle_root, BigUint::from(14u32));
        assert_eq!((parsed.pa, parsed.ph, parsed.rh), (pa, ph, rh));
    }

    #[test]
    fn accepts_circomlib_points() {
        // Base8, 2·Base8, 3·Base8 and 4·Base8 as circomlib prints them.
        let signals: Vec<String> = [
            "1",
            "5299619240641551281634865583518297030282874472190772894086521144482721001553",
            "16950150798460657717958625567821834550301663161624707787222815936182638968203",
            "10031262171927540148667355526369034398030886437092045105752248699557385197826",
            "633281375905621697187330766174974863687049529291089048651929454608812697683",
            "2763488322167937039616325905516046217694264098671987087929565332380420898366",
            "15305195750036305661220525648961313310481046260814497672243197092298550508693",
            "12252886604826192316928789929706397349846234911198931249025449955069330867144",
            "1286140751908834028607023759717162073146610688084909004843365841635476459484",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let parsed = parse_proof_successful_smp_signals(&signals).unwrap();
        let g = BabyJubJub::generator();
        assert_eq!(parsed.pubkey_a, g.coordinates());
        assert_eq!(parsed.pa, BabyJubJub::scalar_mul(&g, &BabyJubJub::scalar_from_u64(2)));
        assert_eq!(parsed.ph, BabyJubJub::scalar_mul(&g, &BabyJubJub::scalar_from_u64(3)));
        assert_eq!(parsed.rh, BabyJubJub::scalar_mul(&g, &BabyJubJub::scalar_from_u64(4)));
    }

    #[test]
    fn length_is_exact() {
        for len in [0, 8, 10, 38, 40] {
            let signals = vec!["1".to_string(); len];
            assert!(parse_proof_of_smp_signals(&signals).is_err());
            assert!(parse_proof_successful_smp_signals(&signals).is_err());
        }
    }

    #[test]
    fn rejects_non_decimal() {
        let mut signals = vec!["1".to_string(); PROOF_SUCCESSFUL_SMP_SIGNALS];
        signals[2] = "0x10".to_string();
        assert!(matches!(
            parse_proof_successful_smp_signals(&signals),
            Err(Error::MalformedInput(_))
        ));
    }
}
