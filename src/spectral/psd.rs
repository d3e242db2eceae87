// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Windowed power spectral density estimation with exponential averaging
//!
//! Each call to [`PsdEstimator::update`] consumes one fixed-size block of
//! complex baseband samples, multiplies it by the analysis window, computes
//! the forward FFT, and folds the squared magnitude of every bin into a
//! persistent exponentially-weighted moving average:
//!
//! ```text
//! avg[k] <- alpha * |X[k]|^2 + (1 - alpha) * avg[k]
//! ```
//!
//! All arithmetic runs in `f32`, matching the precision of the incoming
//! samples. The averaged spectrum is initialized to zeros at construction
//! and never reset afterwards.

use crate::window::{self, WindowFunction};
use log::warn;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Exponentially-averaged PSD of a stream of fixed-size sample blocks
pub struct PsdEstimator {
    fft_len: usize,
    alpha: f32,
    beta: f32,
    window: WindowFunction,
    taps: Vec<f32>,
    enbw_db: f32,
    fft: Arc<dyn Fft<f32>>,
    /// Windowed block, overwritten in place by the FFT
    fft_buffer: Vec<Complex<f32>>,
    /// Persistent averaged power spectrum, one value per bin
    avg: Vec<f32>,
}

impl PsdEstimator {
    /// Create an estimator for blocks of `fft_len` samples
    ///
    /// The window taps, their ENBW, and the FFT plan are computed once
    /// here. `alpha` is the EWMA weight for new data; the complementary
    /// weight `beta = 1 - alpha` is derived so the two always sum to one.
    ///
    /// # Arguments
    ///
    /// * `fft_len` - FFT length / block size (positive; validated upstream)
    /// * `alpha` - EWMA smoothing weight in (0, 1]
    /// * `window` - Analysis window (rectangular is a pass-through)
    pub fn new(fft_len: usize, alpha: f32, window: WindowFunction) -> Self {
        let taps = window.taps(fft_len);
        let enbw_db = window::enbw_db(&taps);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_len);

        Self {
            fft_len,
            alpha,
            beta: 1.0 - alpha,
            window,
            taps,
            enbw_db,
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_len],
            avg: vec![0.0; fft_len],
        }
    }

    /// Fold one block into the averaged power spectrum
    ///
    /// The block must hold exactly `fft_len` samples; the streaming driver
    /// guarantees this precondition.
    ///
    /// # Arguments
    ///
    /// * `block` - `fft_len` complex baseband samples
    pub fn update(&mut self, block: &[Complex<f32>]) {
        debug_assert_eq!(block.len(), self.fft_len);

        // Windowing (pass-through when rectangular)
        match self.window {
            WindowFunction::Rectangular => self.fft_buffer.copy_from_slice(block),
            _ => {
                for (out, (sample, tap)) in self
                    .fft_buffer
                    .iter_mut()
                    .zip(block.iter().zip(self.taps.iter()))
                {
                    *out = *sample * *tap;
                }
            }
        }

        // FFT
        self.fft.process(&mut self.fft_buffer);

        // Average |FFT|^2
        let mut dropped = 0usize;
        for (avg, bin) in self.avg.iter_mut().zip(self.fft_buffer.iter()) {
            let next = self.alpha * bin.norm_sqr() + self.beta * *avg;
            if next.is_finite() {
                *avg = next;
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(
                "dropped {} non-finite PSD bins; previous average retained",
                dropped
            );
        }
    }

    /// The persistent averaged power spectrum, one non-negative value per bin
    pub fn avg_spectrum(&self) -> &[f32] {
        &self.avg
    }

    /// ENBW of the analysis window in dB
    pub fn enbw_db(&self) -> f32 {
        self.enbw_db
    }

    /// FFT length / block size
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Helper: complex exponential at an exact bin frequency
    fn tone_block(fft_len: usize, bin: usize, amplitude: f32) -> Vec<Complex<f32>> {
        (0..fft_len)
            .map(|n| {
                let phase = 2.0 * PI * bin as f32 * n as f32 / fft_len as f32;
                Complex::new(amplitude * phase.cos(), amplitude * phase.sin())
            })
            .collect()
    }

    #[test]
    fn test_alpha_one_has_no_memory() {
        // With alpha = 1 the average equals the instantaneous |X|^2 of the
        // most recent block.
        let n = 64;
        let mut psd = PsdEstimator::new(n, 1.0, WindowFunction::Rectangular);

        psd.update(&tone_block(n, 5, 1.0));
        let first = psd.avg_spectrum().to_vec();

        psd.update(&tone_block(n, 9, 2.0));
        let second = psd.avg_spectrum();

        // The previous block left no trace
        let peak: usize = second
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(peak, 9);
        assert!(second[5] < 1e-3 * second[9]);

        // And the first average was the plain squared magnitude: an exact
        // bin tone of amplitude A concentrates (A*N)^2 in its bin.
        let expected = (1.0 * n as f32).powi(2);
        assert!((first[5] - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_ewma_accumulates_toward_steady_state() {
        // Repeatedly feeding the same block converges the average onto the
        // block's |X|^2 with residual beta^k.
        let n = 32;
        let alpha = 0.5;
        let block = tone_block(n, 3, 1.0);
        let mut psd = PsdEstimator::new(n, alpha, WindowFunction::Rectangular);

        let k = 10;
        for _ in 0..k {
            psd.update(&block);
        }

        let expected_peak = (n as f32).powi(2) * (1.0 - (1.0 - alpha).powi(k));
        let got = psd.avg_spectrum()[3];
        assert!(
            (got - expected_peak).abs() / expected_peak < 1e-3,
            "got {}, expected {}",
            got,
            expected_peak
        );
    }

    #[test]
    fn test_average_starts_at_zero() {
        let psd = PsdEstimator::new(128, 0.1, WindowFunction::FlatTop);
        assert!(psd.avg_spectrum().iter().all(|&v| v == 0.0));
        assert_eq!(psd.avg_spectrum().len(), 128);
    }

    #[test]
    fn test_flattop_peak_scaled_by_coherent_gain() {
        // A windowed exact-bin tone concentrates (A * sum(taps))^2 in its
        // bin instead of (A * N)^2.
        let n = 256;
        let mut psd = PsdEstimator::new(n, 1.0, WindowFunction::FlatTop);
        psd.update(&tone_block(n, 17, 1.0));

        let taps_sum: f32 = WindowFunction::FlatTop.taps(n).iter().sum();
        let expected = taps_sum * taps_sum;
        let got = psd.avg_spectrum()[17];
        assert!(
            (got - expected).abs() / expected < 1e-2,
            "got {}, expected {}",
            got,
            expected
        );
    }
}
