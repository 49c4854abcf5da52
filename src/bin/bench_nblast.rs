//! Benchmark NBLAST cloud building and scoring at various scales.
//!
//! Run with: cargo run --release --bin bench_nblast
//!
//! Usage:
//!   bench_nblast               Run default size (20k points per cloud)
//!   bench_nblast 5k 20k 100k   Run multiple sizes
//!   bench_nblast -c 16         Score a 16-cloud matrix
//!   bench_nblast -n 5          Repeat the scoring phase 5 times

use clap::Parser;
use glam::Vec3;
use nblast::{score, CloudConfig, Point3, ScoreMatrix, ScoreTable, VectorCloud};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::time::Instant;

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Parser)]
#[command(name = "bench_nblast")]
#[command(about = "Benchmark NBLAST cloud building and scoring")]
struct Args {
    /// Points per cloud to benchmark (e.g., 5k, 20k, 1m)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Number of clouds in the score matrix
    #[arg(short, long, default_value_t = 8)]
    clouds: usize,

    /// Tangent neighborhood size
    #[arg(short = 'k', long, default_value_t = 10)]
    tangent_neighbors: usize,

    /// k-d tree leaf capacity
    #[arg(long, default_value_t = 10)]
    leaf_size: usize,

    /// Number of scoring iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,
}

fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..1.0);
    let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = (1.0 - z * z).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// A meandering curve sampled every micron, standing in for a traced neurite.
/// Coordinates are nanometers within a roughly whole-brain-sized box.
fn generate_neuron<R: Rng>(n: usize, rng: &mut R) -> Vec<Point3> {
    let step = 1_000.0f32;
    let mut pos = Vec3::new(
        rng.gen_range(-100_000.0..100_000.0),
        rng.gen_range(-100_000.0..100_000.0),
        rng.gen_range(-50_000.0..50_000.0),
    );
    let mut dir = random_unit_vector(rng);

    (0..n)
        .map(|_| {
            let kink = random_unit_vector(rng);
            dir = (dir + kink * 0.25).normalize();
            pos += dir * step;
            Point3::new(pos.x, pos.y, pos.z)
        })
        .collect()
}

/// A table with the published FCWB bin layout and smooth synthetic values:
/// rewarding close, aligned matches and fading negative with distance.
fn synthetic_table() -> ScoreTable {
    let dist_breaks: Vec<f32> = vec![
        0.0, 750.0, 1500.0, 2000.0, 2500.0, 3000.0, 3500.0, 4000.0, 5000.0, 6000.0, 7000.0,
        8000.0, 9000.0, 10000.0, 12000.0, 14000.0, 16000.0, 20000.0, 25000.0, 30000.0, 40000.0,
    ];
    let dot_breaks: Vec<f32> = (0..=10).map(|i| i as f32 / 10.0).collect();

    let mut values = Vec::with_capacity(dist_breaks.len() * dot_breaks.len());
    for &d in &dist_breaks {
        for &a in &dot_breaks {
            values.push((a * 10.0 - 2.0) * (-d / 7500.0).exp() - 0.6);
        }
    }
    ScoreTable::new(dist_breaks, dot_breaks, values).expect("synthetic table is well-formed")
}

fn format_rate(count: usize, ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    let per_sec = count as f64 / (ms / 1000.0);
    if per_sec >= 1_000_000.0 {
        format!("{:.2}M/s", per_sec / 1_000_000.0)
    } else if per_sec >= 1_000.0 {
        format!("{:.1}k/s", per_sec / 1000.0)
    } else {
        format!("{:.0}/s", per_sec)
    }
}

fn format_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        format!("{}", n)
    }
}

struct BenchResult {
    n: usize,
    total_points: usize,
    build_ms: f64,
    matrix_ms: f64,
    matrix_lookups: usize,
}

fn main() {
    let args = Args::parse();

    println!("nblast Benchmark");
    println!("================\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![20_000]
    } else {
        args.sizes
    };

    let config = CloudConfig {
        tangent_neighbors: args.tangent_neighbors,
        leaf_size: args.leaf_size,
    };

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  clouds = {}", args.clouds);
    println!("  tangent neighbors = {}", config.tangent_neighbors);
    println!("  leaf size = {}", config.leaf_size);
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| format_num(n)).collect::<Vec<_>>()
    );
    if args.repeat > 1 {
        println!("  repeat = {}", args.repeat);
    }

    let table = synthetic_table();
    let mut results: Vec<BenchResult> = Vec::new();

    for n in &sizes {
        println!("\n{}", "=".repeat(60));
        println!(
            "Benchmarking {} clouds of ~{} points",
            args.clouds,
            format_num(*n)
        );
        println!("{}", "=".repeat(60));

        let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
        let t_gen = Instant::now();
        let neurons: Vec<Vec<Point3>> = (0..args.clouds)
            .map(|_| {
                // Vary sizes so the matrix is genuinely asymmetric.
                let m = ((*n as f32) * rng.gen_range(0.8..1.2)) as usize;
                generate_neuron(m.max(config.tangent_neighbors), &mut rng)
            })
            .collect();
        let gen_ms = t_gen.elapsed().as_secs_f64() * 1000.0;
        println!("Point generation: {:.1}ms", gen_ms);

        let t_build = Instant::now();
        let clouds: Vec<VectorCloud> = neurons
            .iter()
            .map(|points| {
                VectorCloud::build_with(points, config.clone()).expect("cloud build should succeed")
            })
            .collect();
        let build_ms = t_build.elapsed().as_secs_f64() * 1000.0;
        let total_points: usize = clouds.iter().map(|c| c.num_points()).sum();

        println!(
            "Cloud build:      {:.1}ms ({} points, {})",
            build_ms,
            format_num(total_points),
            format_rate(total_points, build_ms)
        );

        let t_pair = Instant::now();
        let pair = score(&clouds[0], &clouds[1], &table);
        let pair_ms = t_pair.elapsed().as_secs_f64() * 1000.0;
        println!(
            "Single pair:      {:.1}ms (score {:.2}, {})",
            pair_ms,
            pair,
            format_rate(clouds[0].num_points(), pair_ms)
        );

        let mut times: Vec<f64> = Vec::with_capacity(args.repeat);
        let mut last_matrix: Option<ScoreMatrix> = None;
        for iter in 0..args.repeat {
            if args.repeat > 1 {
                print!("  Matrix iteration {}/{}... ", iter + 1, args.repeat);
                io::stdout().flush().unwrap();
            }
            let t_matrix = Instant::now();
            let matrix = ScoreMatrix::build(&clouds, &table);
            let matrix_ms = t_matrix.elapsed().as_secs_f64() * 1000.0;
            times.push(matrix_ms);
            if args.repeat > 1 {
                println!("{:.1}ms", matrix_ms);
            }
            last_matrix = Some(matrix);
        }
        let matrix = last_matrix.expect("at least one iteration runs");
        let matrix_ms = times.iter().cloned().fold(f64::INFINITY, f64::min);
        // Each of the matrix's rows matches every point of its query cloud.
        let matrix_lookups = args.clouds * total_points;

        println!("\nResults:");
        if args.repeat > 1 {
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = times.iter().sum::<f64>() / times.len() as f64;
            println!("  Matrix min:    {:>8.1}ms", matrix_ms);
            println!("  Matrix max:    {:>8.1}ms", max);
            println!("  Matrix avg:    {:>8.1}ms", avg);
        } else {
            println!("  Matrix time:   {:>8.1}ms", matrix_ms);
        }
        println!(
            "  Match rate:    {:>8}",
            format_rate(matrix_lookups, matrix_ms)
        );
        println!("  Self score:    {:>8.2}  (cloud 0)", matrix[(0, 0)]);
        println!("  Fwd / rev:     {:>8.2} / {:.2}", matrix[(0, 1)], matrix[(1, 0)]);

        results.push(BenchResult {
            n: *n,
            total_points,
            build_ms,
            matrix_ms,
            matrix_lookups,
        });
    }

    if results.len() > 1 {
        println!("\n\n{}", "=".repeat(60));
        println!("SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "{:>10} | {:>10} | {:>10} | {:>10} | {:>12}",
            "n/cloud", "points", "build", "matrix", "match rate"
        );
        println!(
            "{:-<10}-+-{:-<10}-+-{:-<10}-+-{:-<10}-+-{:-<12}",
            "", "", "", "", ""
        );

        for r in &results {
            println!(
                "{:>10} | {:>10} | {:>8.1}ms | {:>8.1}ms | {:>12}",
                format_num(r.n),
                format_num(r.total_points),
                r.build_ms,
                r.matrix_ms,
                format_rate(r.matrix_lookups, r.matrix_ms)
            );
        }
    }

    println!("\nBenchmark complete.");
}
