use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

mod list;
mod sweep;

use list::{ChaseList, Direction};
use sweep::{Measurement, SweepConfig};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "cache-sweep", version)]
#[command(
    about = "Pointer-chase read throughput over doubling working-set sizes",
    long_about = None
)]
struct Cli {
    /// Smallest working set in bytes.
    #[arg(long, default_value_t = 1 << 10)]
    start: usize,

    /// Largest working set in bytes.
    #[arg(long, default_value_t = 1 << 29)]
    end: usize,

    /// Filler words per list element.
    #[arg(long, default_value_t = 0)]
    pad: usize,

    /// Accesses per walk = factor * end / word size.
    #[arg(long, default_value_t = 2)]
    access_factor: usize,

    /// Also walk the sequential list backward.
    #[arg(long)]
    backward: bool,

    /// Threads walking each list concurrently.
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Seed for the random list order.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = SweepConfig {
        start: cli.start,
        end: cli.end,
        pad: cli.pad,
        access_factor: cli.access_factor,
    };
    config.validate()?;
    if cli.threads == 0 {
        anyhow::bail!("need at least one thread");
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!(
        "# Access padding: {}\n#",
        config.pad * std::mem::size_of::<usize>()
    );
    log::info!(
        "{} sizes, {} accesses per walk, {} thread(s)",
        config.sizes().len(),
        config.accesses(),
        cli.threads
    );

    // 1) Sequential, forward.
    let results = run(&config, cli.threads, Direction::Forward, |size| {
        ChaseList::sequential(size, config.pad)
    })?;
    print_section("sequential list forward", &results);

    // 2) Sequential, backward.
    if cli.backward {
        let results = run(&config, 1, Direction::Backward, |size| {
            ChaseList::sequential(size, config.pad)
        })?;
        print_section("sequential list backward", &results);
    }

    // 3) Random order, forward.
    let results = run(&config, cli.threads, Direction::Forward, |size| {
        ChaseList::random(size, config.pad, &mut rng)
    })?;
    print_section("random list forward", &results);

    Ok(())
}

/// One measurement series per thread, each over all sizes.
fn run<F>(
    config: &SweepConfig,
    threads: usize,
    direction: Direction,
    mut build: F,
) -> Result<Vec<Vec<Measurement>>>
where
    F: FnMut(usize) -> Result<ChaseList>,
{
    let accesses = config.accesses();
    let mut series = vec![Vec::new(); threads];

    for size in config.sizes() {
        let list = build(size)?;
        log::debug!("size {}: {} elements", size, list.len());
        if threads == 1 {
            series[0].push(sweep::measure(&list, size, accesses, direction));
        } else {
            let per_thread = sweep::measure_threaded(&list, size, accesses, threads);
            for (out, m) in series.iter_mut().zip(per_thread) {
                out.push(m);
            }
        }
    }

    Ok(series)
}

fn print_section(title: &str, series: &[Vec<Measurement>]) {
    for (thread, results) in series.iter().enumerate() {
        if series.len() == 1 {
            println!("# {}", title);
        } else {
            println!("# {} (thread {})", title, thread);
        }
        for m in results {
            println!("{}", m.line());
        }
        println!("\n");
    }
}
