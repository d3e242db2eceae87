// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Peak detection and noise-floor estimation over the averaged spectrum
//!
//! The beacon appears as the maximum bin of the averaged power spectrum.
//! To measure the noise floor, a small region of bins around the peak is
//! excluded (the tone's energy leaks into its neighbors even after
//! windowing) and every remaining bin is averaged. The exclusion region
//! wraps circularly: a peak near bin 0 or bin N-1 excludes bins on both
//! ends of the spectrum.
//!
//! The boundaries `i_s = (i_max - N_excl) mod N` and
//! `i_e = (i_max + N_excl) mod N` are exclusive, i.e. already outside the
//! peak region, so the excluded region holds exactly `2*N_excl - 1` bins
//! and the complement holds `N - (2*N_excl - 1)` bins for every peak
//! position. The circular indexing is the most error-prone part of the
//! estimator, so it lives in the pure [`noise_ranges`] function where it
//! can be tested exhaustively without any FFT involvement.

use std::ops::Range;

/// Per-block result of the peak/noise-floor analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakAnalysis {
    /// Index of the maximum averaged-power bin
    pub i_max: usize,
    /// Averaged power of that bin
    pub peak: f32,
    /// Mean averaged power of all bins outside the exclusion region
    pub noise_floor: f32,
}

/// Compute the circular complement of the peak-exclusion region
///
/// Returns the bins used for the noise-floor average as one half-open
/// range, plus a second range when the excluded region straddles the
/// wraparound boundary. The exclusive boundary bins `i_s` and `i_e`
/// themselves belong to the complement. The total length of the returned
/// ranges is exactly `fft_len - (2 * half_width - 1)`.
///
/// # Arguments
///
/// * `i_max` - Peak bin index in `[0, fft_len)`
/// * `half_width` - Exclusion half-width `N_excl`, with
///   `1 <= half_width` and `2 * half_width < fft_len`
/// * `fft_len` - FFT length
pub fn noise_ranges(
    i_max: usize,
    half_width: usize,
    fft_len: usize,
) -> (Range<usize>, Option<Range<usize>>) {
    let i_s = (i_max + fft_len - half_width) % fft_len;
    let i_e = (i_max + half_width) % fft_len;

    if i_s > i_e {
        // The excluded region wraps around index 0 or N-1; the complement
        // is the single run [i_e, i_s].
        (i_e..i_s + 1, None)
    } else {
        // Contiguous excluded region; the complement is [i_e, N) plus
        // [0, i_s].
        (i_e..fft_len, Some(0..i_s + 1))
    }
}

/// Locate the peak bin and estimate the noise floor
///
/// Ties in the argmax resolve to the lowest index. The noise floor is the
/// sum over the complement ranges divided by `N - (2 * half_width - 1)`,
/// which equals the exact number of bins summed.
///
/// # Arguments
///
/// * `avg_spectrum` - Averaged power spectrum, one value per bin
/// * `half_width` - Exclusion half-width in bins
pub fn analyze(avg_spectrum: &[f32], half_width: usize) -> PeakAnalysis {
    let fft_len = avg_spectrum.len();

    let mut i_max = 0;
    let mut peak = avg_spectrum[0];
    for (i, &v) in avg_spectrum.iter().enumerate().skip(1) {
        if v > peak {
            peak = v;
            i_max = i;
        }
    }

    let (head, tail) = noise_ranges(i_max, half_width, fft_len);
    let mut noise_accum: f32 = avg_spectrum[head].iter().sum();
    if let Some(tail) = tail {
        noise_accum += avg_spectrum[tail].iter().sum::<f32>();
    }
    let n_points = fft_len - (2 * half_width - 1);
    let noise_floor = noise_accum / n_points as f32;

    PeakAnalysis {
        i_max,
        peak,
        noise_floor,
    }
}
