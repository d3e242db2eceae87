// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Streaming beacon sink: the estimator's driver
//!
//! [`BeaconSink`] accepts buffers of complex baseband samples of arbitrary
//! length, slices them into fixed-size FFT blocks, and runs each block
//! through the estimation pipeline (PSD averaging, peak/noise-floor
//! analysis, measurement calculation). After a call returns, the published
//! measurement holds the result of the last block processed in that call;
//! blocks are otherwise independent except for the averaged spectrum
//! carried across all of them. Remainder samples that do not fill a block
//! are discarded; a host that wants them must retain them for the next
//! call.
//!
//! Processing is synchronous and single-threaded per instance. The
//! measurement snapshot, however, may be read concurrently by an observer
//! through [`BeaconSink::shared_measurement`]; the whole snapshot is
//! replaced under one lock write so observers never see a mixed-block
//! pair of values.

use crate::config::{BeaconConfig, ConfigError};
use crate::measurement::{bin_to_freq, compute_cnr, Measurement, SharedMeasurement};
use crate::spectral::{analyze, PsdEstimator};
use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{debug, info};
use num_complex::Complex;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Streaming CW beacon CNR / frequency estimator
///
/// # Example
///
/// ```
/// use beacon_cnr::{BeaconConfig, BeaconSink};
/// use beacon_cnr::utility::SignalGenerator;
///
/// let fft_len = 512;
/// let samp_rate = 240e3;
/// let mut sink = BeaconSink::new(BeaconConfig::windowed(0.0, fft_len, 0.1, samp_rate)).unwrap();
///
/// let freq = 50.0 * samp_rate / fft_len as f32;
/// let mut generator = SignalGenerator::new(1);
/// let samples = generator.tone_in_noise(100 * fft_len, 1.0, freq, samp_rate, 25.0, fft_len);
/// sink.process(&samples).unwrap();
///
/// let freq_est = sink.get_freq().unwrap();
/// assert!((freq_est - freq).abs() <= samp_rate / fft_len as f32);
/// ```
pub struct BeaconSink {
    config: BeaconConfig,
    psd: PsdEstimator,
    measurement: SharedMeasurement,
    /// Smoothed mean block magnitude (legacy profile)
    avg_ampl: f32,
    t_last_log: Option<Instant>,
}

impl BeaconSink {
    /// Create an estimator instance
    ///
    /// Validates the configuration, generates the window taps and their
    /// ENBW, plans the FFT, and zeroes the averaged spectrum. All of this
    /// happens exactly once; the parameters are immutable afterwards.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid; this is
    /// fatal to instance creation.
    pub fn new(config: BeaconConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let psd = PsdEstimator::new(config.fft_len, config.alpha, config.window);
        debug!(
            "beacon sink: fft_len={} alpha={} window={:?} enbw={:.2} dB",
            config.fft_len,
            config.alpha,
            config.window,
            psd.enbw_db()
        );
        Ok(Self {
            config,
            psd,
            measurement: Arc::new(RwLock::new(Measurement::default())),
            avg_ampl: 0.0,
            t_last_log: None,
        })
    }

    /// Process a buffer of complex baseband samples
    ///
    /// Runs `floor(len / fft_len)` full blocks through the pipeline and
    /// publishes the last block's measurement. A buffer shorter than one
    /// block (including an empty one) leaves the averaged spectrum and the
    /// published measurement untouched.
    ///
    /// # Errors
    ///
    /// Fails only if the measurement lock was poisoned by a panicking
    /// reader; the spectral computation itself does not fail.
    pub fn process(&mut self, samples: &[Complex<f32>]) -> Result<()> {
        let fft_len = self.config.fft_len;

        let mut latest: Option<Measurement> = None;
        for block in samples.chunks_exact(fft_len) {
            self.psd.update(block);

            let analysis = analyze(self.psd.avg_spectrum(), self.config.excl_half_width);
            let cnr_db = compute_cnr(
                analysis.peak,
                analysis.noise_floor,
                self.psd.enbw_db(),
                self.config.cnr_mode,
            );
            let freq_hz = self
                .config
                .samp_rate
                .map(|fs| bin_to_freq(analysis.i_max, fft_len, fs));
            let avg_ampl = if self.config.track_amplitude {
                let mean_mag =
                    block.iter().map(|s| s.norm()).sum::<f32>() / fft_len as f32;
                self.avg_ampl =
                    self.config.alpha * mean_mag + (1.0 - self.config.alpha) * self.avg_ampl;
                Some(self.avg_ampl)
            } else {
                None
            };

            latest = Some(Measurement {
                cnr_db,
                freq_hz,
                avg_ampl,
                timestamp: Utc::now(),
            });
        }

        if let Some(measurement) = latest {
            // Replace the snapshot as a whole so a concurrent observer
            // never pairs a new CNR with a stale frequency.
            let mut guard = self
                .measurement
                .write()
                .map_err(|_| anyhow!("measurement lock poisoned"))?;
            *guard = measurement;
        }

        self.maybe_log_status();
        Ok(())
    }

    /// Latest CNR measurement in dB
    pub fn get_cnr(&self) -> f32 {
        self.snapshot().cnr_db
    }

    /// Latest carrier frequency offset in Hz, if the estimator reports
    /// frequency (windowed profile)
    pub fn get_freq(&self) -> Option<f32> {
        self.snapshot().freq_hz
    }

    /// Latest smoothed amplitude, if the estimator tracks it (legacy
    /// profile)
    pub fn get_avg_ampl(&self) -> Option<f32> {
        self.snapshot().avg_ampl
    }

    /// A copy of the latest measurement snapshot
    pub fn measurement(&self) -> Measurement {
        self.snapshot()
    }

    /// Shared handle for a concurrent observer (reporting/logging path)
    pub fn shared_measurement(&self) -> SharedMeasurement {
        Arc::clone(&self.measurement)
    }

    /// The persistent averaged power spectrum
    pub fn avg_spectrum(&self) -> &[f32] {
        self.psd.avg_spectrum()
    }

    fn snapshot(&self) -> Measurement {
        self.measurement
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Emit the periodic status line when the configured interval elapsed
    fn maybe_log_status(&mut self) {
        if self.config.log_period <= 0.0 {
            return;
        }
        let due = match self.t_last_log {
            None => true,
            Some(t) => t.elapsed().as_secs_f32() > self.config.log_period,
        };
        if !due {
            return;
        }

        let m = self.snapshot();
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        match (m.freq_hz, m.avg_ampl) {
            (Some(freq), _) => {
                info!("{} Freq: {:.1} Hz CNR: {:.2} dB", timestamp, freq, m.cnr_db)
            }
            (None, Some(ampl)) => {
                info!("{} Ampl: {:.4} CNR: {:.2} dB", timestamp, ampl, m.cnr_db)
            }
            (None, None) => info!("{} CNR: {:.2} dB", timestamp, m.cnr_db),
        }
        self.t_last_log = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::SignalGenerator;
    use std::thread;

    fn windowed_sink(fft_len: usize, alpha: f32, samp_rate: f32) -> BeaconSink {
        BeaconSink::new(BeaconConfig::windowed(0.0, fft_len, alpha, samp_rate)).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BeaconConfig::windowed(0.0, 1024, 2.0, 1e6);
        assert!(BeaconSink::new(config).is_err());
    }

    #[test]
    fn test_zero_samples_is_a_no_op() {
        let fft_len = 256;
        let samp_rate = 1e6;
        let mut sink = windowed_sink(fft_len, 0.5, samp_rate);

        let tone = SignalGenerator::cw_tone(4 * fft_len, 1.0, 40e3, samp_rate);
        sink.process(&tone).unwrap();

        let spectrum_before = sink.avg_spectrum().to_vec();
        let before = sink.measurement();

        sink.process(&[]).unwrap();

        assert_eq!(sink.avg_spectrum(), spectrum_before.as_slice());
        let after = sink.measurement();
        assert_eq!(after.cnr_db, before.cnr_db);
        assert_eq!(after.freq_hz, before.freq_hz);
        assert_eq!(after.timestamp, before.timestamp);
    }

    #[test]
    fn test_remainder_samples_are_discarded() {
        let fft_len = 128;
        let samp_rate = 1e6;
        let mut full = windowed_sink(fft_len, 0.5, samp_rate);
        let mut ragged = windowed_sink(fft_len, 0.5, samp_rate);

        let tone = SignalGenerator::cw_tone(3 * fft_len, 1.0, 100e3, samp_rate);
        full.process(&tone[..2 * fft_len]).unwrap();
        // Same two blocks plus half a block of trailing samples
        ragged.process(&tone[..2 * fft_len + fft_len / 2]).unwrap();

        assert_eq!(full.avg_spectrum(), ragged.avg_spectrum());
        assert_eq!(full.get_cnr(), ragged.get_cnr());
    }

    #[test]
    fn test_exact_bin_tone_detected() {
        let fft_len = 512;
        let samp_rate = 240e3;
        let bin = 51;
        let freq = bin as f32 * samp_rate / fft_len as f32;
        let mut sink = windowed_sink(fft_len, 0.1, samp_rate);

        let mut generator = SignalGenerator::new(2);
        let samples =
            generator.tone_in_noise(100 * fft_len, 1.0, freq, samp_rate, 30.0, fft_len);
        sink.process(&samples).unwrap();

        let df = samp_rate / fft_len as f32;
        let freq_est = sink.get_freq().expect("windowed profile reports frequency");
        assert!(
            (freq_est - freq).abs() <= df,
            "freq {} vs expected {}",
            freq_est,
            freq
        );
    }

    #[test]
    fn test_negative_frequency_reported() {
        let fft_len = 512;
        let samp_rate = 240e3;
        let freq = -40.0 * samp_rate / fft_len as f32;
        let mut sink = windowed_sink(fft_len, 0.2, samp_rate);

        let mut generator = SignalGenerator::new(5);
        let samples =
            generator.tone_in_noise(50 * fft_len, 1.0, freq, samp_rate, 30.0, fft_len);
        sink.process(&samples).unwrap();

        let df = samp_rate / fft_len as f32;
        let freq_est = sink.get_freq().unwrap();
        assert!(
            (freq_est - freq).abs() <= df,
            "freq {} vs expected {}",
            freq_est,
            freq
        );
    }

    #[test]
    fn test_legacy_profile_reports_amplitude_not_frequency() {
        let fft_len = 256;
        let mut sink = BeaconSink::new(BeaconConfig::legacy(0.0, fft_len, 0.1)).unwrap();

        // Pure tone, no noise: smoothed amplitude converges onto |A|
        let tone = SignalGenerator::cw_tone(200 * fft_len, 0.5, 10e3, 1e6);
        sink.process(&tone).unwrap();

        assert!(sink.get_freq().is_none());
        let ampl = sink.get_avg_ampl().expect("legacy profile tracks amplitude");
        assert!((ampl - 0.5).abs() < 0.01, "amplitude {}", ampl);
    }

    #[test]
    fn test_measurements_update_per_call() {
        // The published snapshot reflects the last block of the latest
        // call, with the averaged spectrum carried across calls.
        let fft_len = 512;
        let samp_rate = 240e3;
        let freq = 60.0 * samp_rate / fft_len as f32;
        let mut sink = windowed_sink(fft_len, 0.05, samp_rate);

        let mut generator = SignalGenerator::new(9);
        let samples =
            generator.tone_in_noise(200 * fft_len, 1.0, freq, samp_rate, 25.0, fft_len);

        let mut last_cnr = f32::NAN;
        for chunk in samples.chunks(10 * fft_len) {
            sink.process(chunk).unwrap();
            last_cnr = sink.get_cnr();
        }
        assert!(last_cnr.is_finite());
        assert!((last_cnr - 25.0).abs() < 2.0, "cnr {}", last_cnr);
    }

    #[test]
    fn test_shared_measurement_observed_from_another_thread() {
        let fft_len = 512;
        let samp_rate = 240e3;
        let freq = 30.0 * samp_rate / fft_len as f32;
        let mut sink = windowed_sink(fft_len, 0.1, samp_rate);
        let shared = sink.shared_measurement();

        let mut generator = SignalGenerator::new(4);
        let samples =
            generator.tone_in_noise(50 * fft_len, 1.0, freq, samp_rate, 30.0, fft_len);
        sink.process(&samples).unwrap();

        let observed = thread::spawn(move || {
            shared
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        })
        .join()
        .unwrap();

        // The snapshot is internally consistent: frequency and CNR come
        // from the same block.
        assert_eq!(observed.cnr_db, sink.get_cnr());
        assert_eq!(observed.freq_hz, sink.get_freq());
    }
}
