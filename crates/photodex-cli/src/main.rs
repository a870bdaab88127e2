use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use photodex_core::{Catalog, Extractor, IndexOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "photodex", version, about = "Index photo metadata into a SQLite catalog")]
struct Cli {
    /// Directory to scan (or a single file)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// SQLite catalog file (created if missing)
    #[arg(short, long, default_value = "images.db")]
    database: PathBuf,

    /// Only index files whose MIME type contains this (case-insensitive)
    #[arg(short, long, default_value = "image")]
    mime: String,

    /// Metadata extraction engine
    #[arg(long, value_enum, default_value_t = Extractor::Auto)]
    extractor: Extractor,

    /// exiftool executable
    #[arg(long, env = "PHOTODEX_EXIFTOOL", default_value = "exiftool")]
    exiftool: PathBuf,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let t_total = std::time::Instant::now();

    let options = IndexOptions {
        root: cli.root,
        database: cli.database,
        mime_filter: cli.mime,
    };

    let source = cli.extractor.build(&cli.exiftool)?;
    let mut catalog = Catalog::open(&options.database)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} {msg}")
            .unwrap(),
    );

    let progress = |stage: &str, current: u64, total: u64, message: &str| match stage {
        "extract" => {
            pb.set_length(total);
            pb.set_position(current);
            pb.set_message(message.to_string());
        }
        _ => pb.println(format!("[{}] {}", stage, message)),
    };
    let result = photodex_core::index(&options, &mut catalog, source.as_ref(), &progress);
    pb.finish_and_clear();
    let result = result?;

    for warning in &result.warnings {
        eprintln!("skipped {}", warning);
    }
    eprintln!(
        "Done! {} files found, {} indexed, {} skipped ({:.2}s)",
        result.discovered,
        result.indexed,
        result.failed,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
