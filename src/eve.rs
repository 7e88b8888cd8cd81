//! The polymorphic eavesdropper, applied to the full photon sequence immediately after
//! preparation and before the photons enter the atmosphere.
//!
//! Each attack strategy maps `(photons, sender_bases, intensity)` to a transformed
//! photon sequence plus a tagged stats record. The sender's own bit and basis arrays
//! (owned by the protocol driver) are never touched here — only the physical photon
//! sequence Bob will eventually measure.

use crate::basis::{measure, random_basis, Basis};
use crate::photon::Photon;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Multi-photon exploit rate for photon-number-splitting, fixed independent of intensity.
const PNS_RATE: f64 = 0.15;
/// Probability PNS disturbs the carried bit when Eve's basis guess misses.
const PNS_DISTURBANCE_RATE: f64 = 0.1;
/// Fixed loss rate for a jammed link, independent of intensity.
const JAMMED_LOSS_RATE: f64 = 0.6;
/// Probability a jammed-but-surviving photon has its bit flipped.
const JAMMED_FLIP_RATE: f64 = 0.5;

/// The five attack strategies an eavesdropper can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    InterceptResend,
    BeamSplitting,
    PhotonNumberSplitting,
    DetectorBlinding,
    JammedLink,
}

impl AttackKind {
    /// Parse an attack tag, falling back to [`AttackKind::InterceptResend`] for anything
    /// unrecognised.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "beam_splitting" => AttackKind::BeamSplitting,
            "photon_number_splitting" => AttackKind::PhotonNumberSplitting,
            "detector_blinding" => AttackKind::DetectorBlinding,
            "jammed_link" => AttackKind::JammedLink,
            _ => AttackKind::InterceptResend,
        }
    }
}

/// Per-attack statistics, tagged so consumers can match on the variant rather than
/// parse a free-form summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttackStats {
    InterceptResend {
        intercepted: usize,
        basis_mismatches: usize,
        expected_qber: &'static str,
    },
    BeamSplitting {
        tapped: usize,
        expected_qber: &'static str,
    },
    PhotonNumberSplitting {
        exploited: usize,
        disturbed: usize,
        expected_qber: &'static str,
    },
    DetectorBlinding {
        blinded: usize,
        expected_qber: &'static str,
    },
    JammedLink {
        jammed: usize,
        dropped: usize,
        flipped: usize,
        expected_qber: &'static str,
    },
}

/// Run `attack` against `photons`, using `sender_bases` to decide basis (mis)matches.
/// Mutates `photons` in place and returns a stats record.
pub fn apply(
    attack: AttackKind,
    photons: &mut [Photon],
    sender_bases: &[Basis],
    intensity: f64,
    rng: &mut impl Rng,
) -> AttackStats {
    match attack {
        AttackKind::InterceptResend => intercept_resend(photons, sender_bases, intensity, rng),
        AttackKind::BeamSplitting => beam_splitting(photons, intensity, rng),
        AttackKind::PhotonNumberSplitting => photon_number_splitting(photons, sender_bases, rng),
        AttackKind::DetectorBlinding => detector_blinding(photons, intensity, rng),
        AttackKind::JammedLink => jammed_link(photons, rng),
    }
}

fn intercept_resend(
    photons: &mut [Photon],
    sender_bases: &[Basis],
    intensity: f64,
    rng: &mut impl Rng,
) -> AttackStats {
    let mut intercepted = 0usize;
    let mut basis_mismatches = 0usize;

    for (i, photon) in photons.iter_mut().enumerate() {
        if !photon.transmitted || !rng.gen_bool(intensity) {
            continue;
        }
        photon.intercepted = true;
        intercepted += 1;

        let eve_basis = random_basis(rng);
        let (measured_bit, eve_matched_sender) =
            measure(photon.bit, sender_bases[i], eve_basis, rng);

        let resend_bit = if eve_basis == sender_bases[i] {
            measured_bit
        } else {
            basis_mismatches += 1;
            if rng.gen_bool(0.5) {
                1 - measured_bit
            } else {
                measured_bit
            }
        };
        let _ = eve_matched_sender;

        photon.reencode(resend_bit, eve_basis);
    }

    AttackStats::InterceptResend {
        intercepted,
        basis_mismatches,
        expected_qber: "~25%",
    }
}

fn beam_splitting(photons: &mut [Photon], intensity: f64, rng: &mut impl Rng) -> AttackStats {
    let tap_rate = intensity * 0.6;
    let mut tapped = 0usize;

    for photon in photons.iter_mut() {
        if photon.transmitted && rng.gen_bool(tap_rate) {
            photon.intercepted = true;
            photon.drop_in_transit();
            tapped += 1;
        }
    }

    AttackStats::BeamSplitting {
        tapped,
        expected_qber: "near baseline, elevated loss",
    }
}

fn photon_number_splitting(
    photons: &mut [Photon],
    sender_bases: &[Basis],
    rng: &mut impl Rng,
) -> AttackStats {
    let mut exploited = 0usize;
    let mut disturbed = 0usize;

    for (i, photon) in photons.iter_mut().enumerate() {
        if !photon.transmitted || !rng.gen_bool(PNS_RATE) {
            continue;
        }
        photon.intercepted = true;
        exploited += 1;

        let eve_basis = random_basis(rng);
        if eve_basis != sender_bases[i] && rng.gen_bool(PNS_DISTURBANCE_RATE) {
            let flipped = 1 - photon.bit;
            let basis = photon.prep_basis;
            photon.reencode(flipped, basis);
            disturbed += 1;
        }
    }

    AttackStats::PhotonNumberSplitting {
        exploited,
        disturbed,
        expected_qber: "3%-7%",
    }
}

fn detector_blinding(photons: &mut [Photon], intensity: f64, rng: &mut impl Rng) -> AttackStats {
    let blind_rate = intensity * 0.8;
    let mut blinded = 0usize;

    for photon in photons.iter_mut() {
        if photon.transmitted && rng.gen_bool(blind_rate) {
            photon.intercepted = true;
            photon.forced_bit = Some(rng.gen_range(0..=1));
            blinded += 1;
        }
    }

    AttackStats::DetectorBlinding {
        blinded,
        expected_qber: "15%-20%",
    }
}

fn jammed_link(photons: &mut [Photon], rng: &mut impl Rng) -> AttackStats {
    let mut jammed = 0usize;
    let mut dropped = 0usize;
    let mut flipped = 0usize;

    for photon in photons.iter_mut() {
        if !photon.transmitted {
            continue;
        }
        photon.intercepted = true;
        jammed += 1;
        if rng.gen_bool(JAMMED_LOSS_RATE) {
            photon.drop_in_transit();
            dropped += 1;
        } else if rng.gen_bool(JAMMED_FLIP_RATE) {
            let flipped_bit = 1 - photon.bit;
            let basis = photon.prep_basis;
            photon.reencode(flipped_bit, basis);
            flipped += 1;
        }
    }

    AttackStats::JammedLink {
        jammed,
        dropped,
        flipped,
        expected_qber: ">40%, expect ABORT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn fresh_photons(n: usize, bases: &[Basis]) -> Vec<Photon> {
        (0..n).map(|i| Photon::prepare(0, bases[i])).collect()
    }

    #[test]
    fn unknown_attack_tag_falls_back_to_intercept_resend() {
        assert_eq!(AttackKind::parse("quantum_ninja"), AttackKind::InterceptResend);
    }

    #[test]
    fn intercept_resend_marks_intercepted_photons() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let bases = vec![Basis::Rectilinear; 200];
        let mut photons = fresh_photons(200, &bases);
        let stats = apply(AttackKind::InterceptResend, &mut photons, &bases, 1.0, &mut rng);
        match stats {
            AttackStats::InterceptResend { intercepted, .. } => assert_eq!(intercepted, 200),
            _ => panic!("wrong variant"),
        }
        assert!(photons.iter().all(|p| p.intercepted));
    }

    #[test]
    fn beam_splitting_only_drops_never_flips() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let bases = vec![Basis::Rectilinear; 500];
        let mut photons = fresh_photons(500, &bases);
        apply(AttackKind::BeamSplitting, &mut photons, &bases, 1.0, &mut rng);
        for p in &photons {
            if p.intercepted {
                assert!(!p.transmitted);
            }
            assert_eq!(p.bit, 0);
        }
    }

    #[test]
    fn detector_blinding_sets_forced_bit_independent_of_basis() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let bases = vec![Basis::Rectilinear; 300];
        let mut photons = fresh_photons(300, &bases);
        apply(AttackKind::DetectorBlinding, &mut photons, &bases, 1.0, &mut rng);
        assert!(photons.iter().any(|p| p.forced_bit.is_some()));
    }

    #[test]
    fn jammed_link_drops_the_majority_of_photons() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let bases = vec![Basis::Rectilinear; 1000];
        let mut photons = fresh_photons(1000, &bases);
        apply(AttackKind::JammedLink, &mut photons, &bases, 1.0, &mut rng);
        let surviving = photons.iter().filter(|p| p.transmitted).count();
        assert!(surviving < 600, "expected heavy loss, got {surviving} survivors");
    }
}
