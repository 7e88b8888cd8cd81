//! The photon record carried through every pipeline stage.

use crate::basis::{encode_state, Basis, PhotonState};
use serde::{Deserialize, Serialize};

/// A single BB84 photon as it travels from preparation through measurement.
///
/// The photon sequence is always carried as a fixed-length array indexed by the
/// photon's original position, never resized or filtered. A dropped photon keeps its
/// slot with `transmitted = false` instead of being removed, so downstream stages never
/// need to reconstruct the mapping back to the original index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photon {
    /// The classical bit currently carried. May diverge from the sender's original bit
    /// after an eavesdropper's intercept-resend attack.
    pub bit: u8,
    /// The basis the bit is currently encoded in. May diverge from the sender's
    /// announced basis after an intercept-resend attack.
    pub prep_basis: Basis,
    /// Polarization state, always `encode_state(bit, prep_basis)`.
    pub state: PhotonState,
    /// Whether the photon is still in flight. Set to `false` by any stage that drops it.
    pub transmitted: bool,
    /// Whether an eavesdropper has touched this photon.
    pub intercepted: bool,
    /// Set by the detector-blinding attack. When present, measurement yields this bit
    /// unconditionally, bypassing the basis-dependent rule in [`crate::basis::measure`].
    pub forced_bit: Option<u8>,
}

impl Photon {
    /// Prepare a fresh, untouched photon encoding `bit` in `basis`.
    pub fn prepare(bit: u8, basis: Basis) -> Self {
        Self {
            bit,
            prep_basis: basis,
            state: encode_state(bit, basis),
            transmitted: true,
            intercepted: false,
            forced_bit: None,
        }
    }

    /// Re-encode this photon with a new bit and basis, as an eavesdropper's resent
    /// photon would be. Updates `state` to stay consistent.
    pub fn reencode(&mut self, bit: u8, basis: Basis) {
        self.bit = bit;
        self.prep_basis = basis;
        self.state = encode_state(bit, basis);
    }

    /// Mark this photon as lost in transit.
    pub fn drop_in_transit(&mut self) {
        self.transmitted = false;
    }
}

/// Prepare `n` fresh photons from parallel bit and basis sequences.
pub fn prepare_photons(bits: &[u8], bases: &[Basis]) -> Vec<Photon> {
    debug_assert_eq!(bits.len(), bases.len());
    bits.iter()
        .zip(bases.iter())
        .map(|(&bit, &basis)| Photon::prepare(bit, basis))
        .collect()
}
