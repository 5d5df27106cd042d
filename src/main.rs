use anyhow::{bail, Context, Result};
use clap::Parser;
use quantmul::kernels::fixed_point::quantize_multiplier;
use quantmul::{elementwise_mul_s8, elementwise_mul_s8_par, ActivationRange, MulParams};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "quantmul", version, about = "Quantized int8 element-wise multiply")]
struct Args {
    /// First input, comma separated int8 values
    #[arg(long, allow_hyphen_values = true)]
    a: Option<String>,

    /// Second input, comma separated int8 values
    #[arg(long, allow_hyphen_values = true)]
    b: Option<String>,

    /// Generate random inputs of this length instead of --a/--b
    #[arg(long)]
    random: Option<usize>,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// JSON params file (overrides the individual parameter flags)
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    input_1_offset: i32,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    input_2_offset: i32,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    out_offset: i32,

    /// Q31 output multiplier
    #[arg(long, default_value_t = i32::MAX)]
    out_mult: i32,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    out_shift: i32,

    /// Real rescale factor; replaces --out-mult/--out-shift when given
    #[arg(long)]
    scale: Option<f64>,

    #[arg(long, default_value_t = -128, allow_hyphen_values = true)]
    act_min: i32,

    #[arg(long, default_value_t = 127)]
    act_max: i32,

    /// Worker threads (>1 uses the chunked parallel kernel)
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Elements per parallel chunk
    #[arg(long, default_value_t = 4096)]
    chunk: usize,

    /// Write the effective params to this JSON file
    #[arg(long)]
    save_params: Option<PathBuf>,

    /// Print a JSON report instead of plain text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn parse_vector(name: &str, s: &str) -> Result<Vec<i8>> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<i8>().with_context(|| format!("{name}: bad int8 value '{t}'")))
        .collect()
}

fn build_params(args: &Args) -> Result<MulParams> {
    if let Some(path) = &args.params {
        return MulParams::load_json(path).with_context(|| format!("load params {}", path.display()));
    }
    let (out_mult, out_shift) = match args.scale {
        Some(real) => quantize_multiplier(real).with_context(|| format!("scale {real} not representable"))?,
        None => (args.out_mult, args.out_shift),
    };
    let params = MulParams {
        input_1_offset: args.input_1_offset,
        input_2_offset: args.input_2_offset,
        out_offset: args.out_offset,
        out_mult,
        out_shift,
        activation: ActivationRange::new(args.act_min, args.act_max),
    };
    params.validate()?;
    Ok(params)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let params = build_params(&args)?;

    let (a, b) = match (args.random, args.a.as_deref(), args.b.as_deref()) {
        (Some(n), _, _) => {
            let mut rng = SmallRng::seed_from_u64(args.seed);
            let a: Vec<i8> = (0..n).map(|_| rng.gen()).collect();
            let b: Vec<i8> = (0..n).map(|_| rng.gen()).collect();
            (a, b)
        }
        (None, Some(a), Some(b)) => (parse_vector("a", a)?, parse_vector("b", b)?),
        _ => bail!("provide --a and --b, or --random N"),
    };
    if a.len() != b.len() {
        bail!("input lengths differ: {} vs {}", a.len(), b.len());
    }

    if let Some(path) = &args.save_params {
        params.save_json(path)?;
    }

    let mut out = vec![0i8; a.len()];
    let summary = if args.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build()?;
        pool.install(|| elementwise_mul_s8_par(&a, &b, &params, &mut out, a.len(), args.chunk))?
    } else {
        elementwise_mul_s8(&a, &b, &params, &mut out, a.len())?
    };

    if args.json {
        let report = serde_json::json!({
            "params": params,
            "output": out,
            "packed_groups": summary.packed_groups,
            "scalar_tail": summary.scalar_tail,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let text: Vec<String> = out.iter().map(|v| v.to_string()).collect();
        println!("{}", text.join(","));
        eprintln!("packed_groups={} scalar_tail={}", summary.packed_groups, summary.scalar_tail);
    }
    Ok(())
}
