//! Quantum bit-error-rate sampling and four-tier security classification.

use crate::round2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Security verdict derived from the measured QBER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityLevel {
    Secure,
    Acceptable,
    Suspicious,
    Abort,
}

impl SecurityLevel {
    pub fn from_qber_percent(qber: f64) -> Self {
        if qber < 5.0 {
            SecurityLevel::Secure
        } else if qber < 11.0 {
            SecurityLevel::Acceptable
        } else if qber < 15.0 {
            SecurityLevel::Suspicious
        } else {
            SecurityLevel::Abort
        }
    }

    pub fn safe_to_use(self) -> bool {
        matches!(self, SecurityLevel::Secure | SecurityLevel::Acceptable)
    }

    pub fn assessment(self) -> &'static str {
        match self {
            SecurityLevel::Secure => "channel is secure, error rate within expected noise floor",
            SecurityLevel::Acceptable => "error rate elevated but within the BB84 security threshold",
            SecurityLevel::Suspicious => "error rate exceeds the security threshold, possible eavesdropping",
            SecurityLevel::Abort => "error rate indicates an active eavesdropper, key must be discarded",
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SecurityLevel::Secure => "SECURE",
            SecurityLevel::Acceptable => "ACCEPTABLE",
            SecurityLevel::Suspicious => "SUSPICIOUS",
            SecurityLevel::Abort => "ABORT",
        };
        write!(f, "{s}")
    }
}

/// Full error-rate analysis of a sifted key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorAnalysis {
    pub qber_percent: f64,
    pub error_count: usize,
    pub tested_bit_count: usize,
    pub tested_indices: Vec<usize>,
    pub basis_match_count: usize,
    pub basis_match_rate_percent: f64,
    pub security_level: SecurityLevel,
    pub assessment: &'static str,
    pub safe_to_use: bool,
}

/// Compute QBER and classify security from the sender's original bits, the measured
/// bits, and the indices the two parties agree matched bases on.
///
/// `sender_bits` and `measured_bits` are both indexed by original photon position;
/// `matching_indices` is the sifted set. `num_bits` is the total photon count, used to
/// compute the basis-match rate over the whole run rather than just the sifted subset.
pub fn analyze(
    sender_bits: &[u8],
    measured_bits: &[Option<u8>],
    matching_indices: &[usize],
    num_bits: usize,
    rng: &mut impl Rng,
) -> ErrorAnalysis {
    let basis_match_count = matching_indices.len();
    let basis_match_rate_percent = if num_bits == 0 {
        0.0
    } else {
        round2((basis_match_count as f64 / num_bits as f64) * 100.0)
    };

    if matching_indices.is_empty() {
        return ErrorAnalysis {
            qber_percent: 0.0,
            error_count: 0,
            tested_bit_count: 0,
            tested_indices: Vec::new(),
            basis_match_count: 0,
            basis_match_rate_percent,
            security_level: SecurityLevel::Secure,
            assessment: SecurityLevel::Secure.assessment(),
            safe_to_use: true,
        };
    }

    let sample_size = (matching_indices.len() / 2).max(10).min(matching_indices.len());

    let mut pool = matching_indices.to_vec();
    pool.shuffle(rng);
    let mut tested_indices: Vec<usize> = pool.into_iter().take(sample_size).collect();
    tested_indices.sort_unstable();

    let error_count = tested_indices
        .iter()
        .filter(|&&i| measured_bits[i] != Some(sender_bits[i]))
        .count();

    let qber_percent = if error_count == 0 {
        round2((100.0 / sample_size as f64).max(0.5))
    } else {
        round2((error_count as f64 / sample_size as f64) * 100.0)
    };

    let security_level = SecurityLevel::from_qber_percent(qber_percent);

    ErrorAnalysis {
        qber_percent,
        error_count,
        tested_bit_count: sample_size,
        tested_indices,
        basis_match_count,
        basis_match_rate_percent,
        security_level,
        assessment: security_level.assessment(),
        safe_to_use: security_level.safe_to_use(),
    }
}
