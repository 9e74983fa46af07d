mod logging;
mod lookup2;
mod preimage;
mod records;
mod resolver;
mod runtime_config;

use std::{fs, path::Path, time::Instant};

use anyhow::{Context, Result};
use preimage::{KeyTemplate, PreimageTable};
use runtime_config::Config;

fn main() -> Result<()> {
    let start_time = Instant::now();

    // get command line arguments, exits with the usage on missing files
    let config = Config::new().context("could not parse command line arguments")?;

    // logging setup
    let log_file_path = config.log_file.as_deref().map(Path::new);
    if config.verbose {
        logging::init(log::LevelFilter::Trace, log_file_path)
            .context("could not set logging level to verbose")?;
    } else {
        logging::init(log::LevelFilter::Info, log_file_path)
            .context("could not set default logging level")?;
    }

    // disable parallel working on verbose flag
    let threads = if config.verbose {
        1
    } else {
        config.threads.unwrap_or_else(num_cpus::get)
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("could not set rayon number of threads")?;

    let report = run(&config)?;
    eprintln!("{}", report);

    log::info!("Done. Elapsed: {:.2?}", start_time.elapsed());
    log::logger().flush();
    Ok(())
}

/// Resolves the input file of the configuration and writes the output file.
/// Returns the diagnostic line listing the unresolved hashes.
fn run(config: &Config) -> Result<String> {
    let input = fs::read_to_string(&config.input_file)
        .with_context(|| format!("could not read input file {}", config.input_file))?;

    let table = build_table(config);

    let resolution = resolver::resolve(&table, records::parse_records(&input));
    if resolution.unresolved().is_empty() {
        log::info!("resolved all {} ids", resolution.resolved().len());
    } else {
        log::info!(
            "resolved {} ids, {} hashes could not be looked up",
            resolution.resolved().len(),
            resolution.unresolved().len()
        );
    }

    fs::write(&config.output_file, resolution.to_output())
        .with_context(|| format!("could not write output file {}", config.output_file))?;
    log::info!("wrote {}", config.output_file);

    Ok(resolution.unresolved().report())
}

fn build_table(config: &Config) -> PreimageTable {
    let range = config.range.clone();
    let template = KeyTemplate::new(config.prefix.as_str());
    log::info!(
        "hashing keys {} up to {} (exclusive) on {} threads...",
        template.key(range.start),
        template.key(range.end),
        rayon::current_num_threads()
    );

    let build_start = Instant::now();
    let table = PreimageTable::build(range, &template, config.initval);
    if table.is_empty() {
        log::warn!("the id range is empty, no hash can be looked up");
    } else {
        log::info!(
            "built table with {} hashes in {:.2?}",
            table.len(),
            build_start.elapsed()
        );
    }
    table
}
