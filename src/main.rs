//! Cimiento CLI — declarative landing-zone compiler.

use clap::Parser;

fn main() {
    let cli = cimiento::cli::Cli::parse();
    if let Err(e) = cimiento::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
