//! FileHash CLI - Hash strings and benchmark algorithms
//!
//! Thin front end over the library's one-shot hashing layer.

use clap::Parser;
use filehash::config::{CliArgs, Commands, HashAlgorithm, HasherConfig, OutputFormat};
use filehash::error::Result;
use filehash::hash::{benchmark_algorithms, hash_string, HashOptions};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    init_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {} [{}]", e, e.code());
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let config = HasherConfig::from_cli(args)?;
    tracing::debug!("Effective configuration: {:?}", config);

    match &args.command {
        Commands::Hash {
            text,
            algorithm,
            encoding,
            mode,
            key,
            key_encoding,
        } => {
            let algorithm = algorithm.unwrap_or(config.default_algorithm);
            let options = HashOptions {
                mode: *mode,
                key: key.clone(),
                key_encoding: *key_encoding,
            };
            cmd_hash(text, algorithm, *encoding, &options, args.output)
        }
        Commands::Algorithms => cmd_algorithms(args.output),
        Commands::Bench { .. } => cmd_bench(&config, args.output),
    }
}

fn cmd_hash(
    text: &str,
    algorithm: HashAlgorithm,
    encoding: filehash::config::InputEncoding,
    options: &HashOptions,
    output: OutputFormat,
) -> Result<()> {
    let result = hash_string(text, algorithm, encoding, options)?;
    tracing::info!("Hashed {} bytes with {} ({})", result.size, algorithm, options.mode.name());

    match output {
        OutputFormat::Text => println!("{}", result.hash),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn cmd_algorithms(output: OutputFormat) -> Result<()> {
    if output == OutputFormat::Json {
        let list: Vec<_> = HashAlgorithm::ALL
            .iter()
            .map(|a| {
                serde_json::json!({
                    "name": a.name(),
                    "output_bits": a.output_size() * 8,
                    "cryptographic": a.is_cryptographic(),
                    "hmac": a.is_hmac_capable(),
                    "keyed": a.is_keyed_capable(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("=== Supported Algorithms ===\n");
    println!("{:<10} {:>6}  {:<8} Modes", "Name", "Bits", "Secure");
    for algorithm in HashAlgorithm::ALL {
        let mut modes = vec!["hash"];
        if algorithm.is_hmac_capable() {
            modes.push("hmac");
        }
        if algorithm.is_keyed_capable() {
            modes.push("keyed");
        }
        println!(
            "{:<10} {:>6}  {:<8} {}",
            algorithm.name(),
            algorithm.output_size() * 8,
            if algorithm.is_cryptographic() { "yes" } else { "no" },
            modes.join(", ")
        );
    }
    Ok(())
}

fn cmd_bench(config: &HasherConfig, output: OutputFormat) -> Result<()> {
    let results = benchmark_algorithms(config.bench_size, config.bench_iterations);

    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("=== FileHash Benchmark ===");
    println!(
        "Buffer size: {}",
        humansize::format_size(config.bench_size, humansize::BINARY)
    );
    println!("Iterations:  {}\n", config.bench_iterations);

    for result in &results {
        println!(
            "{:<10} {:>12}  {:>10.1} MiB/s",
            result.algorithm.name(),
            format!("{:.2?}", result.duration),
            result.throughput_mibps
        );
    }
    Ok(())
}
