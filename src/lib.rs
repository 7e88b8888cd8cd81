//! # Quantum SatLink QKD
//!
//! A simulation core for BB84 quantum key distribution over a satellite-to-ground
//! free-space optical channel. Given a requested key length and a set of channel and
//! adversary parameters, [`protocol::run_protocol`] drives photon preparation, an
//! optional eavesdropper, atmospheric and weather loss, measurement, sifting, QBER
//! estimation with security classification, and privacy amplification, and returns a
//! complete [`protocol::Trace`] of the run.
//!
//! ## Architecture
//!
//! The pipeline is seven stages, run in strict sequence by the protocol driver:
//!
//! 1. [`basis`] — the two BB84 measurement bases and the single-photon measurement rule.
//! 2. [`photon`] — the photon record carried through every stage.
//! 3. [`eve`] — a polymorphic eavesdropper applied immediately after preparation.
//! 4. [`atmosphere`] — distance-dependent free-space loss and polarization noise.
//! 5. [`weather`] — a second, named-condition attenuation stage.
//! 6. [`qber`] — error-rate sampling and four-tier security classification.
//! 7. [`protocol`] — the driver itself, privacy amplification, and trace assembly.
//!
//! [`encryption`] is a downstream collaborator: it turns a [`protocol::Trace`]'s final
//! key into an AES-256-CBC key and can encrypt/decrypt messages with it.
//!
//! ## Quick start
//!
//! ```
//! use quantum_satlink_qkd::protocol::{QkdConfig, run_protocol};
//!
//! let config = QkdConfig::default();
//! let trace = run_protocol(&config).expect("default config is always valid");
//! assert_eq!(trace.alice_bits.len(), config.num_bits);
//! ```

pub mod basis;
pub mod photon;
pub mod atmosphere;
pub mod weather;
pub mod eve;
pub mod qber;
pub mod protocol;
pub mod encryption;
pub mod logging;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for the simulation core and its encryption collaborator.
///
/// The core never raises for a randomised outcome — a zero-length final key or an
/// `ABORT` security level is a normal, successful [`protocol::Trace`]. `QkdError` only
/// covers boundary failures: a config outside its documented range, or a downstream
/// encryption operation that cannot proceed.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum QkdError {
    /// A [`protocol::QkdConfig`] field fell outside its documented range.
    ///
    /// Examples: `num_bits` below 64 or above 2048, `eve_interception_rate` outside
    /// `[0.0, 1.0]`, `distance_km` outside `[100, 2000]`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The encryption collaborator was given fewer key bits than it needs to derive a key.
    #[error("insufficient key material: need at least {needed} bits, got {got}")]
    InsufficientKey { needed: usize, got: usize },

    /// Base64, padding, or UTF-8 failure while encrypting or decrypting.
    #[error("encryption error: {0}")]
    Encryption(String),
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, QkdError>;

/// Round `x` to two decimal places, matching the precision the original reference
/// implementation reports every percentage/rate field at.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_to_two_decimal_places() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(round2(99.999), 100.0);
    }
}
