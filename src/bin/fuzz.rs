use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use quantmul::kernels::scalar::mul_s8_scalar;
use quantmul::{elementwise_mul_s8, ActivationRange, MulParams};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "quantmul-fuzz", about = "Randomized equivalence check of the dispatcher against the scalar path")]
struct Args {
    #[arg(long, default_value_t = 10_000)]
    trials: usize,
    #[arg(long, default_value_t = 67)]
    max_len: usize,
    #[arg(long, default_value_t = 1)]
    threads: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Also draw input offsets outside the 16-bit lane-safe range
    #[arg(long, default_value_t = false)]
    wide_offsets: bool,
}

#[derive(Debug)]
struct Mismatch {
    trial: usize,
    params: MulParams,
    reason: String,
}

fn random_params(rng: &mut SmallRng, wide: bool) -> MulParams {
    let offset = |rng: &mut SmallRng| if wide && rng.gen_bool(0.1) { rng.gen_range(-70_000..=70_000) } else { rng.gen_range(-128..=127) };
    let lo = rng.gen_range(-200..=100);
    let hi = rng.gen_range(lo..=200);
    MulParams {
        input_1_offset: offset(rng),
        input_2_offset: offset(rng),
        out_offset: rng.gen_range(-128..=127),
        out_mult: rng.gen_range(1 << 30..=i32::MAX),
        out_shift: rng.gen_range(-16..=2),
        activation: ActivationRange::new(lo, hi),
    }
}

fn run_trial(trial: usize, seed: u64, max_len: usize, wide: bool) -> Option<Mismatch> {
    let mut rng = SmallRng::seed_from_u64(seed ^ (trial as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    let params = random_params(&mut rng, wide);
    let n = rng.gen_range(0..=max_len);
    let a: Vec<i8> = (0..n).map(|_| rng.gen()).collect();
    let b: Vec<i8> = (0..n).map(|_| rng.gen()).collect();

    let mut fast = vec![0i8; n];
    let mut reference = vec![0i8; n];
    if let Err(e) = elementwise_mul_s8(&a, &b, &params, &mut fast, n) {
        return Some(Mismatch { trial, params, reason: format!("kernel error: {e}") });
    }
    mul_s8_scalar(&a, &b, &params, &mut reference);
    if let Some(i) = (0..n).find(|&i| fast[i] != reference[i]) {
        let reason = format!("index {i}: dispatcher {} vs scalar {}", fast[i], reference[i]);
        return Some(Mismatch { trial, params, reason });
    }
    let (lo, hi) = params.activation.effective();
    if let Some(v) = fast.iter().find(|v| **v < lo || **v > hi) {
        return Some(Mismatch { trial, params, reason: format!("{v} outside [{lo}, {hi}]") });
    }
    None
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads.max(1)).build()?;

    let pb = ProgressBar::new(args.trials as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} trials ({per_sec})")?);
    let failures: Vec<Mismatch> = pool.install(|| {
        (0..args.trials)
            .into_par_iter()
            .filter_map(|t| {
                let r = run_trial(t, args.seed, args.max_len, args.wide_offsets);
                pb.inc(1);
                r
            })
            .collect()
    });
    pb.finish();

    for f in failures.iter().take(10) {
        eprintln!("trial {}: {} ({:?})", f.trial, f.reason, f.params);
    }
    if !failures.is_empty() {
        anyhow::bail!("{} of {} trials failed", failures.len(), args.trials);
    }
    eprintln!("{} trials passed", args.trials);
    Ok(())
}
