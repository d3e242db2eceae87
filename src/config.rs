// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Beacon estimator configuration
//!
//! This module defines the construction parameters of a [`BeaconSink`]
//! instance. Parameters are validated once at construction and immutable
//! thereafter.
//!
//! Two estimator variants existed historically: the current one (flat-top
//! windowed, ENBW-compensated, frequency-reporting) and a legacy one
//! (unwindowed, direct peak/noise ratio, amplitude-reporting). Both are
//! expressed here as configurations of a single estimator, via the
//! [`BeaconConfig::windowed`] and [`BeaconConfig::legacy`] profile
//! constructors, rather than as separate types.
//!
//! [`BeaconSink`]: crate::sink::BeaconSink

use crate::measurement::CnrMode;
use crate::window::WindowFunction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors detected while validating a [`BeaconConfig`]
///
/// These are configuration errors, fatal to instance creation; they are
/// never produced at runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fft_len must be a positive integer")]
    InvalidFftLen,
    #[error("alpha must lie in (0, 1], got {0}")]
    InvalidAlpha(f32),
    #[error("samp_rate must be positive, got {0}")]
    InvalidSampRate(f32),
    #[error("exclusion half-width {half_width} too wide for fft_len {fft_len}")]
    ExclusionTooWide { half_width: usize, fft_len: usize },
}

/// Configuration for the beacon CNR/frequency estimator
///
/// # Signal Processing Parameters
///
/// * `fft_len` - Analysis block size and FFT length (a power of two is
///   recommended for FFT performance, but not required)
/// * `alpha` - EWMA smoothing weight applied to each new power spectrum
/// * `samp_rate` - Sample rate in Hz, required for frequency reporting
/// * `window` - Analysis window applied before the FFT
/// * `cnr_mode` - Which of the two historical CNR formulas to apply
/// * `excl_half_width` - Half-width of the peak-exclusion region used for
///   noise-floor estimation, in bins; must satisfy `2 * excl_half_width <
///   fft_len` and should be much smaller than `fft_len` (a properly
///   windowed CW tone decays rapidly away from its bin)
///
/// # Reporting Parameters
///
/// * `log_period` - Minimum spacing between status-line emissions, in
///   seconds; `0` (or any non-positive value) disables them
/// * `track_amplitude` - Smooth and publish the mean block magnitude
///   (legacy profile only)
///
/// # Example
///
/// ```
/// use beacon_cnr::config::BeaconConfig;
///
/// let config = BeaconConfig::windowed(10.0, 1024, 0.1, 1e6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Minimum spacing between status emissions in seconds (<= 0 disables)
    #[serde(default)]
    pub log_period: f32,

    /// FFT length / analysis block size
    pub fft_len: usize,

    /// EWMA smoothing weight for new data, in (0, 1]
    pub alpha: f32,

    /// Sample rate in Hz; omitted in the non-frequency-reporting variant
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub samp_rate: Option<f32>,

    /// Analysis window applied before the FFT
    #[serde(default = "default_window")]
    pub window: WindowFunction,

    /// CNR formula variant
    #[serde(default = "default_cnr_mode")]
    pub cnr_mode: CnrMode,

    /// Half-width of the peak-exclusion region in bins
    #[serde(default = "default_excl_half_width")]
    pub excl_half_width: usize,

    /// Smooth and publish the mean block magnitude (legacy variant)
    #[serde(default)]
    pub track_amplitude: bool,
}

fn default_window() -> WindowFunction {
    WindowFunction::FlatTop
}

fn default_cnr_mode() -> CnrMode {
    CnrMode::CarrierPlusNoise
}

fn default_excl_half_width() -> usize {
    8 // A windowed CW peak decays within a few bins
}

impl BeaconConfig {
    /// Current estimator profile: flat-top windowed, ENBW-compensated CNR,
    /// frequency reporting
    ///
    /// # Arguments
    ///
    /// * `log_period` - Status emission spacing in seconds (<= 0 disables)
    /// * `fft_len` - FFT length / block size
    /// * `alpha` - EWMA smoothing weight in (0, 1]
    /// * `samp_rate` - Sample rate in Hz
    pub fn windowed(log_period: f32, fft_len: usize, alpha: f32, samp_rate: f32) -> Self {
        Self {
            log_period,
            fft_len,
            alpha,
            samp_rate: Some(samp_rate),
            window: WindowFunction::FlatTop,
            cnr_mode: CnrMode::CarrierPlusNoise,
            excl_half_width: 8,
            track_amplitude: false,
        }
    }

    /// Legacy estimator profile: unwindowed, direct peak/noise CNR,
    /// amplitude reporting, no frequency output
    ///
    /// # Arguments
    ///
    /// * `log_period` - Status emission spacing in seconds (<= 0 disables)
    /// * `fft_len` - FFT length / block size
    /// * `alpha` - EWMA smoothing weight in (0, 1]
    pub fn legacy(log_period: f32, fft_len: usize, alpha: f32) -> Self {
        Self {
            log_period,
            fft_len,
            alpha,
            samp_rate: None,
            window: WindowFunction::Rectangular,
            cnr_mode: CnrMode::Direct,
            excl_half_width: 32,
            track_amplitude: true,
        }
    }

    /// Validate the configuration
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration can construct an estimator, otherwise
    /// the first [`ConfigError`] encountered
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_len == 0 {
            return Err(ConfigError::InvalidFftLen);
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha > 1.0 {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if let Some(fs) = self.samp_rate {
            if !fs.is_finite() || fs <= 0.0 {
                return Err(ConfigError::InvalidSampRate(fs));
            }
        }
        // An exclusion region covering the whole spectrum would leave no
        // bins for the noise-floor average.
        if self.excl_half_width == 0 || 2 * self.excl_half_width >= self.fft_len {
            return Err(ConfigError::ExclusionTooWide {
                half_width: self.excl_half_width,
                fft_len: self.fft_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windowed_profile() {
        let config = BeaconConfig::windowed(10.0, 1024, 0.1, 1e6);
        assert_eq!(config.fft_len, 1024);
        assert_eq!(config.samp_rate, Some(1e6));
        assert_eq!(config.window, WindowFunction::FlatTop);
        assert_eq!(config.cnr_mode, CnrMode::CarrierPlusNoise);
        assert_eq!(config.excl_half_width, 8);
        assert!(!config.track_amplitude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_profile() {
        let config = BeaconConfig::legacy(10.0, 512, 0.01);
        assert_eq!(config.samp_rate, None);
        assert_eq!(config.window, WindowFunction::Rectangular);
        assert_eq!(config.cnr_mode, CnrMode::Direct);
        assert_eq!(config.excl_half_width, 32);
        assert!(config.track_amplitude);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_fft_len() {
        let mut config = BeaconConfig::windowed(0.0, 1024, 0.1, 1e6);
        config.fft_len = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidFftLen));
    }

    #[test]
    fn test_validation_rejects_bad_alpha() {
        for alpha in [0.0f32, -0.5, 1.5, f32::NAN] {
            let config = BeaconConfig::windowed(0.0, 1024, alpha, 1e6);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidAlpha(_))),
                "alpha {} accepted",
                alpha
            );
        }
        // Boundary: alpha = 1 is valid (no memory)
        assert!(BeaconConfig::windowed(0.0, 1024, 1.0, 1e6).validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_samp_rate() {
        let config = BeaconConfig::windowed(0.0, 1024, 0.1, 0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidSampRate(0.0)));
    }

    #[test]
    fn test_validation_rejects_wide_exclusion() {
        let mut config = BeaconConfig::windowed(0.0, 16, 0.1, 1e6);
        assert_eq!(config.excl_half_width, 8);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ExclusionTooWide { .. })
        ));
        config.excl_half_width = 7;
        assert!(config.validate().is_ok());
        config.excl_half_width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ExclusionTooWide { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = BeaconConfig::legacy(5.0, 256, 0.05);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("samp_rate"));
        let back: BeaconConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fft_len, 256);
        assert_eq!(back.window, WindowFunction::Rectangular);
        assert_eq!(back.cnr_mode, CnrMode::Direct);
    }
}
