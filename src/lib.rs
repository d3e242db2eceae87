// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! CW beacon CNR and carrier-frequency estimator
//!
//! This library measures, in real time from a stream of complex baseband
//! samples, the carrier frequency offset and carrier-to-noise ratio (CNR)
//! of a narrowband continuous-wave beacon buried in noise. It is the
//! measurement engine behind a receiver's beacon-tracking / link-quality
//! indicator.
//!
//! # Pipeline
//!
//! Each fixed-size block of samples is multiplied by a flat-top analysis
//! window, transformed with an FFT, and its squared-magnitude spectrum is
//! folded into an exponentially-weighted moving average. The averaged
//! spectrum's maximum bin is the beacon; the noise floor is the mean of
//! all bins outside a small circular exclusion region around the peak.
//! Peak, noise floor, and the window's equivalent noise bandwidth then
//! yield the CNR in dB, and the peak bin index yields the frequency
//! offset in Hz.
//!
//! # Usage
//!
//! ```
//! use beacon_cnr::{BeaconConfig, BeaconSink};
//! use beacon_cnr::utility::SignalGenerator;
//!
//! let fft_len = 1024;
//! let samp_rate = 1e6;
//! let config = BeaconConfig::windowed(0.0, fft_len, 0.1, samp_rate);
//! let mut sink = BeaconSink::new(config).unwrap();
//!
//! // Simulate a 20 dB beacon on FFT bin 100 and feed it to the sink
//! let freq = 100.0 * samp_rate / fft_len as f32;
//! let mut generator = SignalGenerator::new(12345);
//! let samples = generator.tone_in_noise(100 * fft_len, 1.0, freq, samp_rate, 20.0, fft_len);
//! sink.process(&samples).unwrap();
//!
//! println!("freq: {:?} Hz, CNR: {} dB", sink.get_freq(), sink.get_cnr());
//! ```

pub mod config;
pub mod measurement;
pub mod sink;
pub mod spectral;
pub mod utility;
pub mod window;

pub use config::{BeaconConfig, ConfigError};
pub use measurement::{CnrMode, Measurement, SharedMeasurement};
pub use sink::BeaconSink;
pub use window::WindowFunction;
