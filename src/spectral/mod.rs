// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Spectral Estimation Module
//!
//! Frequency-domain machinery of the beacon estimator:
//!
//! - [`psd`] maintains the exponentially-averaged power spectral density
//!   of the incoming sample blocks (windowing, FFT, squared magnitude,
//!   EWMA update).
//! - [`analysis`] locates the beacon peak in the averaged spectrum and
//!   estimates the noise floor from the bins outside a circular
//!   peak-exclusion region.
//!
//! The averaged spectrum is owned by one [`PsdEstimator`] instance and
//! mutated only by its `update` step; it persists across blocks and is
//! never reset after construction.

pub mod analysis;
pub mod psd;

pub use analysis::{analyze, PeakAnalysis};
pub use psd::PsdEstimator;
