use clap::Parser;

mod model;
mod render;
mod sample;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "numa-latency-plot", version)]
#[command(about = "Plot memory latency per core and NUMA node", long_about = None)]
struct Cli {
    /// Tab-separated sample table with `mnode`, `pyscpu` and measurement columns.
    input: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    println!("{}", cli.input);

    // 1) Load samples.
    let samples = sample::parse_sample_file(&cli.input)?;
    if samples.is_empty() {
        log::warn!(
            "{} has no rows for columns {}, chart will be empty",
            samples.path,
            samples.measurement_columns.join(", ")
        );
    }

    // 2) Aggregate.
    let table = model::aggregate(&samples)?;
    print!("{}", table);

    // 3) Show chart (blocks until the window is closed).
    render::show(&table)?;

    Ok(())
}
