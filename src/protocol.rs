//! The protocol driver: config validation, the seven-stage pipeline, privacy
//! amplification, and trace assembly.

use crate::atmosphere::{self, ChannelStats};
use crate::basis::{generate_random_bases, measure, Basis};
use crate::eve::{self, AttackKind, AttackStats};
use crate::logging::{self, LogCategory};
use crate::photon::prepare_photons;
use crate::qber::{self, ErrorAnalysis};
use crate::weather::{self, WeatherCondition, WeatherStats};
use crate::{QkdError, Result};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

const MIN_NUM_BITS: usize = 64;
const MAX_NUM_BITS: usize = 2048;
const MIN_DISTANCE_KM: f64 = 100.0;
const MAX_DISTANCE_KM: f64 = 2000.0;
const MIN_APERTURE_CM: f64 = 10.0;
const MAX_APERTURE_CM: f64 = 100.0;

/// Time of day at the ground station. Accepted and reported but does not alter the
/// numerical channel model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Day,
    Night,
}

/// Configuration for one simulated BB84 run.
///
/// Every field has a documented range; call [`QkdConfig::validate`] (or go through
/// [`run_protocol`], which validates for you) before trusting a config built from
/// untrusted input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QkdConfig {
    /// Number of raw bits to prepare. Range 64-2048.
    pub num_bits: usize,
    /// Whether an eavesdropper is present on the channel.
    pub eve_active: bool,
    /// Fraction of photons Eve attempts to attack, in `[0.0, 1.0]`.
    pub eve_interception_rate: f64,
    /// Which of the five attack strategies Eve runs. Unknown tags fall back to
    /// intercept-resend rather than failing validation.
    pub eve_attack_type: String,
    /// Satellite-to-ground distance in kilometers. Range 100-2000.
    pub distance_km: f64,
    /// Named weather condition. Unknown tags fall back to clear skies.
    pub weather: String,
    pub time_of_day: TimeOfDay,
    /// Receiving telescope aperture in centimeters. Range 10-100.
    pub telescope_aperture_cm: f64,
}

impl Default for QkdConfig {
    fn default() -> Self {
        Self {
            num_bits: 256,
            eve_active: false,
            eve_interception_rate: 0.5,
            eve_attack_type: "intercept_resend".to_string(),
            distance_km: 500.0,
            weather: "clear".to_string(),
            time_of_day: TimeOfDay::Night,
            telescope_aperture_cm: 30.0,
        }
    }
}

impl QkdConfig {
    /// Validate every range-bound field. `weather` and `eve_attack_type` are not
    /// range-checked here: unrecognised tags are a documented fallback, not an error.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_NUM_BITS..=MAX_NUM_BITS).contains(&self.num_bits) {
            return Err(QkdError::Configuration(format!(
                "num_bits must be between {MIN_NUM_BITS} and {MAX_NUM_BITS}, got {}",
                self.num_bits
            )));
        }
        if !(0.0..=1.0).contains(&self.eve_interception_rate) {
            return Err(QkdError::Configuration(format!(
                "eve_interception_rate must be between 0.0 and 1.0, got {}",
                self.eve_interception_rate
            )));
        }
        if !(MIN_DISTANCE_KM..=MAX_DISTANCE_KM).contains(&self.distance_km) {
            return Err(QkdError::Configuration(format!(
                "distance_km must be between {MIN_DISTANCE_KM} and {MAX_DISTANCE_KM}, got {}",
                self.distance_km
            )));
        }
        if !(MIN_APERTURE_CM..=MAX_APERTURE_CM).contains(&self.telescope_aperture_cm) {
            return Err(QkdError::Configuration(format!(
                "telescope_aperture_cm must be between {MIN_APERTURE_CM} and {MAX_APERTURE_CM}, got {}",
                self.telescope_aperture_cm
            )));
        }
        Ok(())
    }
}

/// The complete output of one `run_protocol` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub alice_bits: Vec<u8>,
    pub alice_bases: Vec<Basis>,
    pub bob_bases: Vec<Basis>,
    pub measured_bits: Vec<Option<u8>>,
    pub bases_matched: Vec<bool>,
    pub matching_indices: Vec<usize>,
    pub sifted_key: Vec<u8>,
    pub final_key: Vec<u8>,
    pub final_key_hex: String,
    pub transmission_efficiency_percent: f64,
    pub basis_match_efficiency_percent: f64,
    pub key_efficiency_percent: f64,
    pub error_analysis: ErrorAnalysis,
    pub channel_stats: ChannelStats,
    pub weather_stats: WeatherStats,
    pub attack_stats: Option<AttackStats>,
    pub secure: bool,
}

/// Run one full BB84 simulation using an OS-entropy-seeded RNG.
///
/// This is the convenience entry point for callers who don't need reproducibility.
/// For deterministic/seeded runs (tests, benchmarks), use [`run_protocol_with_rng`].
pub fn run_protocol(config: &QkdConfig) -> Result<Trace> {
    let mut seed = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut seed);
    let mut rng = ChaCha20Rng::from_seed(seed);
    run_protocol_with_rng(config, &mut rng)
}

/// Run one full BB84 simulation using the supplied RNG.
pub fn run_protocol_with_rng(config: &QkdConfig, rng: &mut impl Rng) -> Result<Trace> {
    logging::init_tracing();
    config.validate()?;
    let n = config.num_bits;

    // 1. prepare
    let alice_bits: Vec<u8> = (0..n).map(|_| rng.gen_range(0..=1)).collect();
    let alice_bases = generate_random_bases(n, rng);
    let mut photons = prepare_photons(&alice_bits, &alice_bases);
    info!(category = %LogCategory::Protocol, num_bits = n, "prepared photon sequence");

    // 2. eve
    let attack_stats = if config.eve_active {
        let attack = AttackKind::parse(&config.eve_attack_type);
        let stats = eve::apply(attack, &mut photons, &alice_bases, config.eve_interception_rate, rng);
        info!(category = %LogCategory::Eve, attack = ?attack, "eavesdropper applied");
        Some(stats)
    } else {
        None
    };

    // 3. transmit (atmosphere)
    let channel_stats = atmosphere::apply(&mut photons, config.distance_km, rng);
    info!(
        category = %LogCategory::Channel,
        loss_probability = channel_stats.loss_probability,
        "atmospheric transport complete"
    );

    // 4. weather
    let weather_condition = WeatherCondition::parse(&config.weather);
    let weather_stats = weather::apply(&mut photons, weather_condition, rng);
    info!(category = %LogCategory::Channel, condition = ?weather_condition, "weather attenuation applied");

    // 5. measure
    let bob_bases = generate_random_bases(n, rng);
    let mut measured_bits: Vec<Option<u8>> = vec![None; n];
    for i in 0..n {
        if !photons[i].transmitted {
            continue;
        }
        let bit = if let Some(forced) = photons[i].forced_bit {
            forced
        } else {
            let (measured, _) = measure(photons[i].bit, photons[i].prep_basis, bob_bases[i], rng);
            measured
        };
        measured_bits[i] = Some(bit);
    }

    // 6. sift
    let bases_matched: Vec<bool> = (0..n).map(|i| alice_bases[i] == bob_bases[i]).collect();
    let matching_indices: Vec<usize> = (0..n)
        .filter(|&i| measured_bits[i].is_some() && bases_matched[i])
        .collect();
    let sifted_key: Vec<u8> = matching_indices
        .iter()
        .map(|&i| measured_bits[i].expect("filtered to Some above"))
        .collect();
    info!(category = %LogCategory::Protocol, sifted_len = sifted_key.len(), "sifting complete");

    // 7. qber
    let error_analysis = qber::analyze(&alice_bits, &measured_bits, &matching_indices, n, rng);
    info!(
        category = %LogCategory::Qber,
        qber = error_analysis.qber_percent,
        level = %error_analysis.security_level,
        "error-rate analysis complete"
    );

    // 8. amplify
    let tested: std::collections::HashSet<usize> =
        error_analysis.tested_indices.iter().copied().collect();
    let corrected_key: Vec<u8> = matching_indices
        .iter()
        .filter(|i| !tested.contains(i))
        .map(|&i| alice_bits[i])
        .collect();
    let final_key = privacy_amplify(&corrected_key, error_analysis.qber_percent);
    let final_key_hex = bits_to_hex(&final_key);

    let received = measured_bits.iter().filter(|b| b.is_some()).count();
    let transmission_efficiency_percent = if n == 0 {
        0.0
    } else {
        crate::round2((received as f64 / n as f64) * 100.0)
    };
    let basis_match_efficiency_percent = if n == 0 {
        0.0
    } else {
        crate::round2((matching_indices.len() as f64 / n as f64) * 100.0)
    };
    let key_efficiency_percent = if n == 0 {
        0.0
    } else {
        crate::round2((final_key.len() as f64 / n as f64) * 100.0)
    };

    Ok(Trace {
        alice_bits,
        alice_bases,
        bob_bases,
        measured_bits,
        bases_matched,
        matching_indices,
        sifted_key,
        final_key,
        final_key_hex,
        transmission_efficiency_percent,
        basis_match_efficiency_percent,
        key_efficiency_percent,
        secure: error_analysis.safe_to_use,
        error_analysis,
        channel_stats,
        weather_stats,
        attack_stats,
    })
}

/// Shrink `key` by a QBER-dependent factor. Returns an empty key at ABORT-level QBER.
fn privacy_amplify(key: &[u8], qber_percent: f64) -> Vec<u8> {
    let factor = if qber_percent < 5.0 {
        0.9
    } else if qber_percent < 11.0 {
        0.7
    } else if qber_percent < 15.0 {
        0.5
    } else {
        0.0
    };
    if factor == 0.0 || key.is_empty() {
        return Vec::new();
    }
    let len = ((key.len() as f64) * factor).floor().max(1.0) as usize;
    key[..len.min(key.len())].to_vec()
}

/// Render a bit sequence as hex, right-padding with zero bits to a nibble boundary,
/// most-significant-bit first.
pub fn bits_to_hex(bits: &[u8]) -> String {
    let mut padded = bits.to_vec();
    while padded.len() % 4 != 0 {
        padded.push(0);
    }
    padded
        .chunks(4)
        .map(|nibble| {
            let value = nibble.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1));
            std::char::from_digit(value as u32, 16).expect("nibble fits in one hex digit")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn validate_rejects_out_of_range_num_bits() {
        let mut config = QkdConfig::default();
        config.num_bits = 32;
        assert!(config.validate().is_err());
        config.num_bits = 4096;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_boundary_values() {
        let mut config = QkdConfig::default();
        config.num_bits = MIN_NUM_BITS;
        config.distance_km = MIN_DISTANCE_KM;
        config.telescope_aperture_cm = MIN_APERTURE_CM;
        config.eve_interception_rate = 0.0;
        assert!(config.validate().is_ok());
        config.num_bits = MAX_NUM_BITS;
        config.distance_km = MAX_DISTANCE_KM;
        config.telescope_aperture_cm = MAX_APERTURE_CM;
        config.eve_interception_rate = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_ignores_unknown_weather_and_attack_tags() {
        let mut config = QkdConfig::default();
        config.weather = "tornado".to_string();
        config.eve_attack_type = "quantum_ninja".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn trace_has_consistent_shape() {
        let config = QkdConfig {
            num_bits: 256,
            ..QkdConfig::default()
        };
        let mut rng = ChaCha20Rng::seed_from_u64(100);
        let trace = run_protocol_with_rng(&config, &mut rng).unwrap();
        assert_eq!(trace.alice_bits.len(), 256);
        assert_eq!(trace.alice_bases.len(), 256);
        assert_eq!(trace.bob_bases.len(), 256);
        assert_eq!(trace.measured_bits.len(), 256);
        for &i in &trace.matching_indices {
            assert!(trace.bases_matched[i]);
            assert!(trace.measured_bits[i].is_some());
        }
        for (k, &i) in trace.matching_indices.iter().enumerate() {
            assert_eq!(trace.sifted_key[k], trace.measured_bits[i].unwrap());
        }
        assert!(trace.final_key.len() <= trace.sifted_key.len());
    }

    #[test]
    fn hex_rendering_is_a_function() {
        let bits = vec![1, 0, 1, 1, 0, 0, 1, 0];
        assert_eq!(bits_to_hex(&bits), bits_to_hex(&bits));
    }

    #[test]
    fn hex_rendering_round_trips_for_nibble_aligned_input() {
        let bits = vec![1, 0, 1, 1];
        let hex = bits_to_hex(&bits);
        assert_eq!(hex, "b");
    }

    #[test]
    fn no_eve_clear_channel_is_usually_safe() {
        let config = QkdConfig::default();
        let mut safe_count = 0;
        for seed in 0..50u64 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let trace = run_protocol_with_rng(&config, &mut rng).unwrap();
            if trace.secure {
                safe_count += 1;
            }
        }
        assert!(safe_count >= 45, "expected the vast majority of no-Eve runs to be safe, got {safe_count}/50");
    }

    #[test]
    fn jammed_link_usually_aborts() {
        let config = QkdConfig {
            eve_active: true,
            eve_attack_type: "jammed_link".to_string(),
            eve_interception_rate: 1.0,
            ..QkdConfig::default()
        };
        let mut aborts = 0;
        for seed in 0..50u64 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let trace = run_protocol_with_rng(&config, &mut rng).unwrap();
            if matches!(trace.error_analysis.security_level, crate::qber::SecurityLevel::Abort) {
                aborts += 1;
            }
        }
        assert!(aborts >= 45, "expected jammed link to abort nearly always, got {aborts}/50");
    }

    #[test]
    fn privacy_amplify_empties_key_at_abort_level_qber() {
        let key = vec![1u8; 100];
        assert!(privacy_amplify(&key, 20.0).is_empty());
        assert!(!privacy_amplify(&key, 2.0).is_empty());
    }

    proptest::proptest! {
        #[test]
        fn privacy_amplify_never_grows_the_key(
            key in proptest::collection::vec(0u8..=1, 0..500),
            qber_percent in 0.0f64..30.0,
        ) {
            let amplified = privacy_amplify(&key, qber_percent);
            proptest::prop_assert!(amplified.len() <= key.len());
            if qber_percent >= 15.0 {
                proptest::prop_assert!(amplified.is_empty());
            }
        }

        #[test]
        fn bits_to_hex_is_deterministic_and_nibble_bounded(
            bits in proptest::collection::vec(0u8..=1, 0..200),
        ) {
            let hex = bits_to_hex(&bits);
            proptest::prop_assert_eq!(&hex, &bits_to_hex(&bits));
            proptest::prop_assert_eq!(hex.len(), (bits.len() + 3) / 4);
        }
    }
}
