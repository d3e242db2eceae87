// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Synthetic Beacon Signal Generator
//!
//! This module generates the complex baseband signals used to exercise the
//! estimator:
//!
//! 1. Complex Gaussian white noise - for noise-floor calibration
//! 2. Complex exponential (CW) tones - the simulated beacon carrier
//! 3. Tone-in-noise mixtures calibrated to a target CNR
//!
//! The generator is deterministic: the same seed reproduces the same
//! sample sequence, which matters for the estimator QA tests.
//!
//! ## Features
//!
//! * Fast XORShift pseudo-random number generation
//! * Box-Muller transform for Gaussian distribution (both outputs of each
//!   transform are used, one per complex component)
//! * CNR calibration matched to the estimator's PSD convention: an
//!   exact-bin tone of amplitude `A` concentrates `(A*N)^2` in its FFT
//!   bin, so a target CNR of `x` dB requires a per-bin noise PSD of
//!   `(A*N)^2 / 10^(x/10)` and a total noise power of that value over `N`
//!
//! ## Example
//!
//! ```
//! use beacon_cnr::utility::SignalGenerator;
//!
//! let mut generator = SignalGenerator::new(12345);
//!
//! // One FFT block of a 20 dB tone at bin 100 (fs = 1 MHz, N = 1024)
//! let fft_len = 1024;
//! let samp_rate = 1e6;
//! let freq = 100.0 * samp_rate / fft_len as f32;
//! let samples = generator.tone_in_noise(fft_len, 1.0, freq, samp_rate, 20.0, fft_len);
//! assert_eq!(samples.len(), fft_len);
//! ```

use num_complex::Complex;
use std::f32::consts::PI;
use std::time::SystemTime;

/// Deterministic complex-signal generator built on an XORShift PRNG
///
/// Not suitable for cryptographic purposes; more than adequate for
/// simulating receiver noise.
pub struct SignalGenerator {
    /// Internal state of the XORShift random number generator
    rng_state: u32,
}

impl SignalGenerator {
    /// Creates a new generator with a given seed
    ///
    /// The same seed reproduces the same sample sequence.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed value; a zero state would lock the XORShift
    ///   sequence at zero, so it is replaced by 1
    pub fn new(seed: u32) -> Self {
        Self {
            rng_state: seed.max(1),
        }
    }

    /// Creates a new generator seeded from the system time
    ///
    /// # Panics
    ///
    /// Panics if the system time is before the Unix epoch
    pub fn new_from_system_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u32;
        Self::new(seed)
    }

    /// Generates a random floating-point number between -1.0 and 1.0
    pub fn random_float(&mut self) -> f32 {
        // XOR Shift algorithm for pseudo-random numbers
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 17;
        self.rng_state ^= self.rng_state << 5;

        (self.rng_state as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Generates a pair of independent standard Gaussian values
    ///
    /// Uses the Box-Muller transform; the sine and cosine branches supply
    /// one value each.
    pub fn random_gaussian_pair(&mut self) -> (f32, f32) {
        let u1 = (self.random_float() + 1.0) / 2.0;
        let u2 = (self.random_float() + 1.0) / 2.0;

        // Avoid ln(0)
        let u1 = if u1 < 0.0001 { 0.0001 } else { u1 };

        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;
        (r * theta.cos(), r * theta.sin())
    }

    /// Generates complex Gaussian white noise with the given total power
    ///
    /// The standard deviation applies to the complex sample as a whole:
    /// each component gets `std_dev / sqrt(2)`, so `E[|x|^2] = std_dev^2`.
    ///
    /// # Arguments
    ///
    /// * `num_samples` - Number of samples to generate
    /// * `std_dev` - Complex standard deviation (sqrt of total power)
    pub fn complex_noise(&mut self, num_samples: usize, std_dev: f32) -> Vec<Complex<f32>> {
        let component_std = std_dev / 2.0f32.sqrt();
        (0..num_samples)
            .map(|_| {
                let (re, im) = self.random_gaussian_pair();
                Complex::new(re * component_std, im * component_std)
            })
            .collect()
    }

    /// Generates a complex exponential tone `A * exp(j*2*pi*f*n/fs)`
    ///
    /// # Arguments
    ///
    /// * `num_samples` - Number of samples to generate
    /// * `amplitude` - Tone amplitude `A`
    /// * `freq` - Tone frequency in Hz (may be negative)
    /// * `samp_rate` - Sample rate in Hz
    pub fn cw_tone(
        num_samples: usize,
        amplitude: f32,
        freq: f32,
        samp_rate: f32,
    ) -> Vec<Complex<f32>> {
        // Accumulate phase in f64: n * f / fs loses precision in f32 for
        // long sequences.
        let phase_inc = 2.0 * std::f64::consts::PI * freq as f64 / samp_rate as f64;
        (0..num_samples)
            .map(|n| {
                let phase = (phase_inc * n as f64) % (2.0 * std::f64::consts::PI);
                Complex::new(
                    amplitude * phase.cos() as f32,
                    amplitude * phase.sin() as f32,
                )
            })
            .collect()
    }

    /// Generates a CW tone buried in white noise at a target CNR
    ///
    /// The noise variance is calibrated against the estimator's PSD
    /// convention (`P[k] = |FFT[k]|^2`, no normalization): a bin-aligned
    /// tone of amplitude `A` shows `(A*fft_len)^2` on its bin, the flat
    /// noise floor must sit `cnr_db` below that, and a per-bin floor of
    /// `F` corresponds to a total noise power of `F / fft_len`.
    ///
    /// # Arguments
    ///
    /// * `num_samples` - Number of samples to generate
    /// * `amplitude` - Tone amplitude
    /// * `freq` - Tone frequency in Hz
    /// * `samp_rate` - Sample rate in Hz
    /// * `cnr_db` - Target carrier-to-noise ratio in dB
    /// * `fft_len` - FFT length the estimator will analyze with
    pub fn tone_in_noise(
        &mut self,
        num_samples: usize,
        amplitude: f32,
        freq: f32,
        samp_rate: f32,
        cnr_db: f32,
        fft_len: usize,
    ) -> Vec<Complex<f32>> {
        let carrier_psd = (amplitude * fft_len as f32).powi(2);
        let noise_floor = carrier_psd / 10.0f32.powf(cnr_db / 10.0);
        let noise_power = noise_floor / fft_len as f32;

        let tone = Self::cw_tone(num_samples, amplitude, freq, samp_rate);
        let noise = self.complex_noise(num_samples, noise_power.sqrt());
        tone.iter()
            .zip(noise.iter())
            .map(|(t, n)| t + n)
            .collect()
    }
}
