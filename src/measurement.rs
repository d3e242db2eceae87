// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Measurement calculation and publication
//!
//! Converts the per-block analysis results (peak bin, peak value, noise
//! floor) into the exposed measurements: CNR in dB and carrier frequency
//! offset in Hz. Measurements are published as a whole [`Measurement`]
//! snapshot behind a lock so that a concurrent observer (the reporting
//! path) never sees a CNR paired with a stale frequency or a torn value.
//!
//! Degenerate inputs (zero or negative noise floor, non-positive linear
//! CNR) never panic; the `log10` sentinel (`NaN` or `-inf`) propagates into
//! the snapshot and the caller decides its reporting policy. A transient
//! anomaly self-corrects on the next block via the EWMA.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// CNR formula variant
///
/// The two historical estimator variants compute CNR differently, and the
/// difference is material: the windowed variant treats the peak as carrier
/// plus noise and subtracts the noise contribution, while the legacy
/// variant reports the plain peak/noise ratio. Both are preserved as
/// explicit modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CnrMode {
    /// The peak bin holds carrier-plus-noise power:
    /// `CNR = 10*log10(peak/floor - 1) + ENBW_dB`, where the ENBW term
    /// compensates for the window-induced noise-floor inflation.
    CarrierPlusNoise,
    /// Legacy formula: `CNR = 10*log10(peak/floor)`, no `-1` correction and
    /// no ENBW compensation (the legacy variant runs unwindowed).
    Direct,
}

/// One published measurement snapshot
///
/// Updated as a unit on every processed block; read at any time by a
/// concurrent observer through [`SharedMeasurement`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Carrier-to-noise ratio in dB (non-finite on degenerate blocks)
    pub cnr_db: f32,
    /// Carrier frequency offset in Hz; `None` when the estimator was built
    /// without a sample rate (legacy profile)
    pub freq_hz: Option<f32>,
    /// Smoothed mean block magnitude; `None` unless amplitude tracking is
    /// enabled (legacy profile)
    pub avg_ampl: Option<f32>,
    /// UTC time at which the block producing this snapshot was processed
    pub timestamp: DateTime<Utc>,
}

impl Default for Measurement {
    fn default() -> Self {
        Self {
            cnr_db: 0.0,
            freq_hz: None,
            avg_ampl: None,
            timestamp: Utc::now(),
        }
    }
}

/// Thread-safe handle to the latest measurement snapshot
pub type SharedMeasurement = Arc<RwLock<Measurement>>;

/// Compute the CNR in dB from peak power and noise floor
///
/// # Arguments
///
/// * `peak` - Averaged power of the peak bin
/// * `noise_floor` - Mean averaged power outside the peak-exclusion region
/// * `enbw_db` - Window ENBW in dB (ignored in [`CnrMode::Direct`])
/// * `mode` - CNR formula variant
///
/// # Returns
///
/// CNR in dB; non-finite when the inputs admit no valid logarithm
pub fn compute_cnr(peak: f32, noise_floor: f32, enbw_db: f32, mode: CnrMode) -> f32 {
    match mode {
        CnrMode::CarrierPlusNoise => {
            let cnr_lin = peak / noise_floor - 1.0;
            10.0 * cnr_lin.log10() + enbw_db
        }
        CnrMode::Direct => 10.0 * (peak / noise_floor).log10(),
    }
}

/// Map a peak bin index to a signed frequency offset in Hz
///
/// Bins above the Nyquist midpoint represent negative frequencies, per the
/// standard FFT bin ordering.
///
/// # Arguments
///
/// * `i_max` - Peak bin index in `[0, fft_len)`
/// * `fft_len` - FFT length
/// * `samp_rate` - Sample rate in Hz
///
/// # Returns
///
/// Frequency offset in Hz, in `(-samp_rate/2, samp_rate/2]`
pub fn bin_to_freq(i_max: usize, fft_len: usize, samp_rate: f32) -> f32 {
    let i_signed = if i_max > fft_len / 2 {
        i_max as i64 - fft_len as i64
    } else {
        i_max as i64
    };
    i_signed as f32 * (samp_rate / fft_len as f32)
}
