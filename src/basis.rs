//! The two BB84 measurement bases and the single-photon measurement rule.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Detector error rate applied whenever sender and receiver bases agree, modelling
/// dark counts and timing jitter on an otherwise deterministic measurement.
pub const DETECTOR_ERROR_RATE: f64 = 0.008;

/// A BB84 measurement basis: rectilinear (`+`) or diagonal (`×`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Basis {
    Rectilinear,
    Diagonal,
}

impl Basis {
    /// The single-glyph rendering used in traces and logs.
    pub fn glyph(self) -> char {
        match self {
            Basis::Rectilinear => '+',
            Basis::Diagonal => '×',
        }
    }
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// The polarization state a photon carries, fully determined by (bit, basis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhotonState {
    /// Rectilinear, bit 0.
    H,
    /// Rectilinear, bit 1.
    V,
    /// Diagonal, bit 0.
    D45,
    /// Diagonal, bit 1.
    D135,
}

/// Derive the polarization state for a bit encoded in the given basis.
pub fn encode_state(bit: u8, basis: Basis) -> PhotonState {
    match (basis, bit) {
        (Basis::Rectilinear, 0) => PhotonState::H,
        (Basis::Rectilinear, _) => PhotonState::V,
        (Basis::Diagonal, 0) => PhotonState::D45,
        (Basis::Diagonal, _) => PhotonState::D135,
    }
}

/// Draw a uniformly random basis.
pub fn random_basis(rng: &mut impl Rng) -> Basis {
    if rng.gen_bool(0.5) {
        Basis::Rectilinear
    } else {
        Basis::Diagonal
    }
}

/// Draw `n` independent uniformly random bases.
pub fn generate_random_bases(n: usize, rng: &mut impl Rng) -> Vec<Basis> {
    (0..n).map(|_| random_basis(rng)).collect()
}

/// Measure a photon encoded with `bit` in `prep_basis` using `meas_basis`.
///
/// Returns `(measured_bit, bases_matched)`. When the bases agree the result is
/// deterministic up to [`DETECTOR_ERROR_RATE`]; when they disagree the result is a
/// fresh uniform coin flip, independent of the encoded bit.
pub fn measure(bit: u8, prep_basis: Basis, meas_basis: Basis, rng: &mut impl Rng) -> (u8, bool) {
    if prep_basis == meas_basis {
        if rng.gen_bool(DETECTOR_ERROR_RATE) {
            (1 - bit, true)
        } else {
            (bit, true)
        }
    } else {
        (rng.gen_range(0..=1), false)
    }
}
