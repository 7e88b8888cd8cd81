//! Named weather conditions applied as a second attenuation stage after the atmosphere.

use crate::photon::Photon;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A named weather condition affecting the free-space channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    LightHaze,
    HeavyClouds,
    Rain,
}

impl WeatherCondition {
    /// Parse a condition tag, falling back to [`WeatherCondition::Clear`] for anything
    /// unrecognised rather than treating it as a configuration error.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "light_haze" => WeatherCondition::LightHaze,
            "heavy_clouds" => WeatherCondition::HeavyClouds,
            "rain" => WeatherCondition::Rain,
            _ => WeatherCondition::Clear,
        }
    }

    /// Multiplicative loss factor applied over the baseline loss already incurred.
    pub fn loss_factor(self) -> f64 {
        match self {
            WeatherCondition::Clear => 1.0,
            WeatherCondition::LightHaze => 1.3,
            WeatherCondition::HeavyClouds => 2.5,
            WeatherCondition::Rain => 10.0,
        }
    }

    /// Reported error factor. Not folded into the empirical QBER measurement; kept for
    /// callers who want a channel-quality signal independent of the sampled error rate.
    pub fn error_factor(self) -> f64 {
        match self {
            WeatherCondition::Clear => 1.0,
            WeatherCondition::LightHaze => 1.2,
            WeatherCondition::HeavyClouds => 1.8,
            WeatherCondition::Rain => 3.0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear skies, minimal atmospheric interference",
            WeatherCondition::LightHaze => "light haze, moderate scattering",
            WeatherCondition::HeavyClouds => "heavy cloud cover, significant attenuation",
            WeatherCondition::Rain => "rain, severe attenuation and scattering",
        }
    }
}

/// Stats produced by [`apply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherStats {
    pub condition: WeatherCondition,
    pub loss_factor: f64,
    pub error_factor: f64,
    pub lost_to_weather: usize,
    pub total_lost: usize,
    pub description: &'static str,
}

/// Apply weather attenuation on top of whatever loss the photon sequence has already
/// incurred. Only photons still `transmitted = true` can be newly dropped here.
pub fn apply(photons: &mut [Photon], condition: WeatherCondition, rng: &mut impl Rng) -> WeatherStats {
    let total = photons.len();
    let already_lost = photons.iter().filter(|p| !p.transmitted).count();
    let base_loss = if total == 0 {
        0.0
    } else {
        already_lost as f64 / total as f64
    };
    let wx_loss = (base_loss * condition.loss_factor()).min(0.95);
    let incremental = (wx_loss - base_loss).max(0.0);

    let mut lost_to_weather = 0usize;
    for photon in photons.iter_mut() {
        if photon.transmitted && rng.gen_bool(incremental) {
            photon.drop_in_transit();
            lost_to_weather += 1;
        }
    }

    let total_lost = photons.iter().filter(|p| !p.transmitted).count();

    WeatherStats {
        condition,
        loss_factor: condition.loss_factor(),
        error_factor: condition.error_factor(),
        lost_to_weather,
        total_lost,
        description: condition.description(),
    }
}
