use std::path::PathBuf;

use clap::Parser;
use server::config::load_config;
use server::init;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "server.ron")]
    config: PathBuf,

    /// Stop after this many ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    #[arg(long)]
    tick_rate: Option<u64>,

    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(short, long)]
    debug: Option<u8>,

    /// Write a scene snapshot here on exit
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: could not load {}: {err}", args.config.display());
            std::process::exit(1);
        }
    };

    if args.ticks.is_some() {
        config.tick_limit = args.ticks;
    }
    if let Some(rate) = args.tick_rate {
        if rate == 0 {
            eprintln!("Error: tick_rate must be at least 1.");
            std::process::exit(1);
        }
        config.tick_rate = rate;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(level) = args.debug {
        config.debug_level = level;
    }
    if args.snapshot.is_some() {
        config.snapshot_path = args.snapshot;
    }

    init::init(config);
}
