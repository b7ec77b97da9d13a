//! Benchmark runner for the double-double kernels.

use std::f64::consts::{E, PI};
use std::hint::black_box;
use std::time::Instant;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use ddkernels::doubledouble::{add_assign_all, mul_assign_all, product, sum};
use ddkernels::dot::{DotKernels, UNROLL_MAX, UNROLL_MIN};
use ddkernels::horner::SchemeFn;
use ddkernels::kernels::{KernelTable, NR_MAX, kc_for_block};
use ddkernels::{Backend, DoubleDouble};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ddbench")]
#[command(author, version, about = "Latency and throughput of double-double kernels", long_about = None)]
struct Args {
    /// Kernel backend (default: best one the CPU supports)
    #[arg(long, global = true, value_enum, env = "DDBENCH_BACKEND")]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Double-double add/multiply chains and Horner evaluation
    LowLevel {
        /// Which operations to measure
        #[arg(short = 't', long = "type", value_enum)]
        kind: LowLevelKind,

        /// Number of timed runs; the fastest one is reported
        #[arg(short, long, default_value_t = 1000, env = "DDBENCH_ITERATIONS")]
        iterations: usize,

        /// Operations per run
        #[arg(short, long, default_value_t = 1024)]
        repeats: usize,
    },

    /// Dot products in every tier and unroll factor
    Dot {
        /// Number of timed runs; the median is reported
        #[arg(short, long, default_value_t = 1000, env = "DDBENCH_ITERATIONS")]
        iterations: usize,

        /// Bytes per input array (usually half a cache level)
        #[arg(short = 's', long)]
        array_size: usize,
    },

    /// Every ddgemm microkernel in the table
    Ddgemm {
        /// Number of timed runs; the median is reported
        #[arg(short, long, default_value_t = 1000, env = "DDBENCH_ITERATIONS")]
        iterations: usize,

        /// Bytes of A and B panel per call (usually a cache level)
        #[arg(short, long)]
        block_size: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LowLevelKind {
    DoubledoubleLatency,
    DoubledoubleThroughput,
    PolevlLatency,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Scalar,
    Portable,
    Avx2Fma,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Scalar => Backend::Scalar,
            BackendArg::Portable => Backend::Portable,
            BackendArg::Avx2Fma => Backend::Avx2Fma,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let backend = match args.backend {
        Some(arg) => {
            let backend = Backend::from(arg);
            ensure!(
                backend.is_available(),
                "backend {} is not supported by this CPU",
                backend.name()
            );
            backend
        }
        None => Backend::detect(),
    };
    tracing::info!(backend = backend.name(), clock = Clock::UNIT, "starting benchmark");

    match args.command {
        Command::LowLevel {
            kind,
            iterations,
            repeats,
        } => {
            ensure!(iterations > 0, "iterations must be positive");
            ensure!(repeats > 0, "repeats must be positive");
            run_low_level(kind, iterations, repeats);
        }
        Command::Dot {
            iterations,
            array_size,
        } => {
            ensure!(iterations > 0, "iterations must be positive");
            let elements = array_size / size_of::<f64>();
            ensure!(
                elements > 0,
                "array size of {} bytes holds no double",
                array_size
            );
            let kernels = DotKernels::new(backend)
                .with_context(|| format!("no dot-product kernels for {}", backend.name()))?;
            run_dot(&kernels, iterations, elements);
        }
        Command::Ddgemm {
            iterations,
            block_size,
        } => {
            ensure!(iterations > 0, "iterations must be positive");
            let table = KernelTable::new(backend)
                .with_context(|| format!("no ddgemm kernels for {}", backend.name()))?;
            let (mr_max, _) = table.max_tile();
            ensure!(
                kc_for_block(block_size, mr_max, NR_MAX) > 0,
                "block size of {} bytes is too small for a {}x{} tile",
                block_size,
                mr_max,
                NR_MAX
            );
            run_ddgemm(&table, iterations, block_size);
        }
    }
    Ok(())
}

/// Cycle counter where the CPU has one, nanoseconds otherwise.
struct Clock;

impl Clock {
    #[cfg(target_arch = "x86_64")]
    const UNIT: &'static str = "cycles";
    #[cfg(not(target_arch = "x86_64"))]
    const UNIT: &'static str = "ns";

    #[cfg(target_arch = "x86_64")]
    fn ticks() -> u64 {
        // SAFETY: RDTSC is available on every x86-64 CPU.
        unsafe { std::arch::x86_64::_rdtsc() }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn ticks() -> u64 {
        use std::sync::OnceLock;
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }
}

fn min_ticks(iterations: usize, mut f: impl FnMut()) -> u64 {
    (0..iterations)
        .map(|_| {
            let start = Clock::ticks();
            f();
            Clock::ticks().saturating_sub(start)
        })
        .min()
        .unwrap_or(0)
}

fn median<T: Copy + PartialOrd>(mut samples: Vec<T>) -> T {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    samples[samples.len() / 2]
}

fn run_low_level(kind: LowLevelKind, iterations: usize, repeats: usize) {
    println!("=== Low-level double-double operations ===\n");
    println!("{:<24} {:>10} {:>12}", "Operation", "Repeats", Clock::UNIT);
    println!("{}", "-".repeat(48));

    let report = |name: &str, ticks: u64| {
        println!(
            "{:<24} {:>10} {:>12.2}",
            name,
            repeats,
            ticks as f64 / repeats as f64
        );
    };

    match kind {
        LowLevelKind::DoubledoubleLatency | LowLevelKind::DoubledoubleThroughput => {
            let mut values = vec![DoubleDouble::from(1.0); repeats];
            warmup(&values);

            if matches!(kind, LowLevelKind::DoubledoubleLatency) {
                report(
                    "DDADD latency",
                    min_ticks(iterations, || {
                        black_box(sum(black_box(&values)));
                    }),
                );
                report(
                    "DDMUL latency",
                    min_ticks(iterations, || {
                        black_box(product(black_box(&values)));
                    }),
                );
            } else {
                let one = DoubleDouble::from(1.0);
                report(
                    "DDADD throughput",
                    min_ticks(iterations, || add_assign_all(black_box(&mut values), one)),
                );
                report(
                    "DDMUL throughput",
                    min_ticks(iterations, || mul_assign_all(black_box(&mut values), one)),
                );
            }
        }
        LowLevelKind::PolevlLatency => {
            for scheme in SchemeFn::<f64>::all() {
                let ticks = min_ticks(iterations, || {
                    black_box((scheme.iterate)(black_box(PI), repeats));
                });
                report(&format!("{} latency", scheme.name), ticks);
            }
        }
    }
}

fn warmup(values: &[DoubleDouble]) {
    let start = Instant::now();
    for _ in 0..1024 {
        black_box(sum(black_box(values)));
        if start.elapsed().as_secs_f64() >= 1.0 {
            break;
        }
    }
}

fn run_dot(kernels: &DotKernels, iterations: usize, elements: usize) {
    println!(
        "=== Dot products ({}, {} elements) ===\n",
        kernels.backend().name(),
        elements
    );
    println!(
        "{:<12} {:<12} {:>6} {:>12}",
        "Result",
        "Tier",
        "Unroll",
        format!("{}/elem", Clock::UNIT)
    );
    println!("{}", "-".repeat(46));

    let a = vec![PI; elements];
    let b = vec![E; elements];
    let per_element = |ticks: u64| ticks as f64 / elements as f64;
    let time = |f: &dyn Fn()| {
        let samples: Vec<u64> = (0..iterations)
            .map(|_| {
                let start = Clock::ticks();
                f();
                Clock::ticks().saturating_sub(start)
            })
            .collect();
        median(samples)
    };

    for unroll in UNROLL_MIN..=UNROLL_MAX {
        if let Some(dot) = kernels.mul_add(unroll) {
            let ticks = time(&|| {
                black_box(dot(black_box(&a), black_box(&b)));
            });
            println!("{:<12} {:<12} {:>6} {:>12.2}", "double", "mul+add", unroll, per_element(ticks));
        }
    }
    for unroll in UNROLL_MIN..=UNROLL_MAX {
        if let Some(dot) = kernels.fma(unroll) {
            let ticks = time(&|| {
                black_box(dot(black_box(&a), black_box(&b)));
            });
            println!("{:<12} {:<12} {:>6} {:>12.2}", "double", "fma", unroll, per_element(ticks));
        }
    }
    for unroll in UNROLL_MIN..=UNROLL_MAX {
        if let Some(dot) = kernels.compensated(unroll) {
            let ticks = time(&|| {
                black_box(dot(black_box(&a), black_box(&b)));
            });
            println!(
                "{:<12} {:<12} {:>6} {:>12.2}",
                "compensated",
                "efmul+efadd",
                unroll,
                per_element(ticks)
            );
        }
    }
}

fn run_ddgemm(table: &KernelTable, iterations: usize, block_size: usize) {
    println!(
        "=== ddgemm microkernels ({}, {} byte blocks) ===\n",
        table.backend().name(),
        block_size
    );
    println!(
        "{:>10} {:>4} {:>4} {:>8} {:>10}",
        "Block", "mr", "nr", "kc", "GFLOPS"
    );
    println!("{}", "-".repeat(40));

    for entry in table.entries() {
        let kc = kc_for_block(block_size, entry.mr, entry.nr);
        let a = vec![PI; 2 * kc * entry.mr];
        let b = vec![DoubleDouble::from(E); kc * entry.nr];
        let mut c = vec![DoubleDouble::zero(); entry.mr * entry.nr];

        let samples: Vec<f64> = (0..iterations)
            .map(|_| {
                let start = Instant::now();
                (entry.kernel)(kc, black_box(&a), black_box(&b), black_box(&mut c));
                start.elapsed().as_nanos() as f64
            })
            .collect();
        let median_ns = median(samples).max(1.0);
        let gflops = 2.0 * (entry.mr * entry.nr * kc) as f64 / median_ns;

        println!(
            "{:>10} {:>4} {:>4} {:>8} {:>10.3}",
            block_size, entry.mr, entry.nr, kc, gflops
        );
    }
}
