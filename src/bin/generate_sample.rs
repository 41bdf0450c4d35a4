use std::path::PathBuf;

use anyhow::{Context, Result};
use arena_edr::data::writer::EdrWriter;
use clap::Parser;

/// Write a synthetic arena recording for trying out the decoder.
#[derive(Parser)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "150612_113659_stripes_insect01_tr1.edr")]
    output: PathBuf,

    /// Recording length in seconds
    #[arg(long, default_value_t = 300.0)]
    duration: f64,

    /// Sampling interval in seconds
    #[arg(long, default_value_t = 0.001)]
    dt: f64,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Volts → ADC codes for AD=10, ADCMAX=2047, YCF=1.
const CODES_PER_VOLT: f64 = 2048.0 / 10.0;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn to_code(volts: f64) -> i16 {
    (volts * CODES_PER_VOLT)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    // Rig channel order. Decoding moves Freq after LmR; names follow their
    // values, so only the column order changes.
    let mut writer = EdrWriter::new(args.dt, "06-12-2015 11:36:59 AM")
        .channel("Lamp", 1.0)
        .channel("Ramp", 1.0)
        .channel("Sum", 1.0)
        .channel("Freq", 1.0)
        .channel("LmR", 1.0)
        .channel("Barpos", 1.0)
        .extra("ID", "stripes insect01 tr1");

    let n_rows = (args.duration / args.dt).round() as usize;
    let mut steering = 0.0f64;
    let mut bar_angle = 0.0f64;
    for i in 0..n_rows {
        let t = i as f64 * args.dt;

        // slow random walk in steering, bar drifts opposite to it
        steering = 0.999 * steering + rng.gauss(0.0, 0.02);
        bar_angle = (bar_angle - steering * 20.0 * args.dt).rem_euclid(360.0);

        let lamp = 2.0 + 0.2 * steering + 0.1 * (t * 0.5).sin() + rng.gauss(0.0, 0.02);
        let ramp = 2.0 - 0.2 * steering + 0.1 * (t * 0.5).sin() + rng.gauss(0.0, 0.02);
        let freq = 1.9 + rng.gauss(0.0, 0.01);
        let barpos_volts = bar_angle * 5.0 / 360.0;

        writer.push_frame(&[
            to_code(lamp),
            to_code(ramp),
            to_code(lamp + ramp),
            to_code(freq),
            to_code(lamp - ramp),
            to_code(barpos_volts),
        ])?;
    }

    writer
        .write_to(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {n_rows} frames ({:.1}s at dt={}) to {}",
        n_rows as f64 * args.dt,
        args.dt,
        args.output.display()
    );
    Ok(())
}
