mod args;
mod collate;

use clap::Parser;
use log::LevelFilter;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(e) = collate::run_election(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
