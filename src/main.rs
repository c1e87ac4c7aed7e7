mod args;

use args::{validate_args, Args};
use clap::Parser;
use colored::*;
use std::process;
use worldbridge::{convert_world, ConsoleProgress, ConversionOutcome, Statistics};

/// Chunk errors printed before the list is cut short.
const SHOWN_ERRORS: usize = 10;

fn print_banner() {
    let version: &str = env!("CARGO_PKG_VERSION");
    println!(
        r#"
        worldbridge {}
        Java <-> Bedrock world converter
        "#,
        version.bright_white().bold()
    );
}

fn print_summary(stats: &Statistics) {
    println!(
        "{} chunk(s) converted, {} skipped, {} failed",
        stats.chunks_converted.to_string().green().bold(),
        stats.chunks_skipped,
        if stats.chunks_failed > 0 {
            stats.chunks_failed.to_string().red().bold()
        } else {
            stats.chunks_failed.to_string().normal()
        }
    );
    println!(
        "{} block entities, {} entities, {} block(s) fixed up",
        stats.block_entities, stats.entities, stats.terraformed_blocks
    );
    for (version, count) in &stats.versions {
        println!("  source version {version}: {count} chunk(s)");
    }
    for (name, count) in &stats.anomalies {
        println!("  {}: {count}", name.yellow());
    }
    for error in stats.errors.iter().take(SHOWN_ERRORS) {
        println!("  {}", error.to_string().red());
    }
    if stats.errors.len() > SHOWN_ERRORS {
        println!("  ... and {} more", stats.errors.len() - SHOWN_ERRORS);
    }
}

fn main() {
    let args: Args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    print_banner();

    if let Err(e) = validate_args(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }

    println!("{} Reading options...", "[1/3]".bold());
    let options = match args.to_options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}: {}", "Invalid options".red().bold(), e);
            process::exit(1);
        }
    };

    println!(
        "{} Converting {} world {} to {}...",
        "[2/3]".bold(),
        options.source,
        args.input.display(),
        options.target
    );
    let progress = ConsoleProgress::new();
    let result = convert_world(&args.input, &args.output, &options, Some(&progress));
    progress.finish();

    match result {
        Ok(ConversionOutcome::Completed(stats)) => {
            println!(
                "{} {} {}",
                "[3/3]".bold(),
                "Done! World written to".green().bold(),
                args.output.display()
            );
            print_summary(&stats);
        }
        Ok(ConversionOutcome::Cancelled(stats)) => {
            println!("{}", "Conversion cancelled.".yellow().bold());
            print_summary(&stats);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("{}: {}", "Conversion failed".red().bold(), e);
            process::exit(1);
        }
    }
}
