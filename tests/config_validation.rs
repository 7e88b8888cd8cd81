//! Boundary validation scenarios for `QkdConfig`.

use quantum_satlink_qkd::protocol::QkdConfig;

#[test]
fn num_bits_below_minimum_is_rejected() {
    let config = QkdConfig {
        num_bits: 32,
        ..QkdConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn num_bits_above_maximum_is_rejected() {
    let config = QkdConfig {
        num_bits: 4096,
        ..QkdConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn eve_interception_rate_out_of_unit_range_is_rejected() {
    let config = QkdConfig {
        eve_interception_rate: 1.5,
        ..QkdConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn distance_below_minimum_is_rejected() {
    let config = QkdConfig {
        distance_km: 50.0,
        ..QkdConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn unknown_weather_and_attack_tags_are_accepted_and_fall_back_silently() {
    let config = QkdConfig {
        weather: "tornado".to_string(),
        eve_attack_type: "quantum_ninja".to_string(),
        ..QkdConfig::default()
    };
    assert!(config.validate().is_ok());
}
