// Copyright (c) 2026 Ronan LE MEILLAT, SCTG Development
// This file is part of the beacon_cnr project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Beacon Simulator
//!
//! A command-line tool that synthesizes a CW beacon buried in white noise
//! at a known CNR, drives the estimator with it, and reports the measured
//! frequency and CNR. Useful for checking estimator accuracy and for
//! exercising the periodic status logging (run with `RUST_LOG=info`).

use anyhow::Result;
use beacon_cnr::utility::SignalGenerator;
use beacon_cnr::{BeaconConfig, BeaconSink};
use clap::Parser;

#[derive(Parser)]
#[command(name = "beacon_sim")]
#[command(about = "Simulate a CW beacon in noise and estimate its CNR and frequency")]
struct Args {
    /// FFT length (power of 2 recommended)
    #[arg(long, default_value_t = 1024)]
    fft_len: usize,

    /// EWMA smoothing weight for new PSD data, in (0, 1]
    #[arg(long, default_value_t = 0.1)]
    alpha: f32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 1e6)]
    samp_rate: f32,

    /// Beacon frequency offset in Hz (may be negative)
    #[arg(short, long, default_value_t = 97656.25)]
    freq: f32,

    /// Injected CNR in dB
    #[arg(short, long, default_value_t = 20.0)]
    cnr: f32,

    /// Beacon amplitude
    #[arg(long, default_value_t = 1.0)]
    amplitude: f32,

    /// Number of FFT blocks to simulate
    #[arg(short, long, default_value_t = 500)]
    blocks: usize,

    /// Minimum spacing between status log lines in seconds (0 disables)
    #[arg(long, default_value_t = 1.0)]
    log_period: f32,

    /// Use the legacy estimator profile (unwindowed, amplitude-reporting)
    #[arg(long, default_value_t = false)]
    legacy: bool,

    /// Seed for the noise generator (0 picks one from the system time)
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Print the final measurement as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if args.legacy {
        BeaconConfig::legacy(args.log_period, args.fft_len, args.alpha)
    } else {
        BeaconConfig::windowed(args.log_period, args.fft_len, args.alpha, args.samp_rate)
    };
    let mut sink = BeaconSink::new(config)?;

    let mut generator = if args.seed == 0 {
        SignalGenerator::new_from_system_time()
    } else {
        SignalGenerator::new(args.seed)
    };

    println!(
        "Simulating {} blocks of {} samples: tone at {} Hz, {} dB CNR",
        args.blocks, args.fft_len, args.freq, args.cnr
    );

    // Feed the sink a few blocks at a time, like a host scheduler would
    let chunk_blocks = 8;
    let mut remaining = args.blocks;
    while remaining > 0 {
        let n_blocks = remaining.min(chunk_blocks);
        let samples = generator.tone_in_noise(
            n_blocks * args.fft_len,
            args.amplitude,
            args.freq,
            args.samp_rate,
            args.cnr,
            args.fft_len,
        );
        sink.process(&samples)?;
        remaining -= n_blocks;
    }

    let measurement = sink.measurement();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&measurement)?);
    } else {
        println!();
        println!("Measured CNR: {:.2} dB", measurement.cnr_db);
        if let Some(freq) = measurement.freq_hz {
            let df = args.samp_rate / args.fft_len as f32;
            println!("Measured frequency: {:.1} Hz (bin width {:.1} Hz)", freq, df);
        }
        if let Some(ampl) = measurement.avg_ampl {
            println!("Smoothed amplitude: {:.4}", ampl);
        }
    }

    Ok(())
}
