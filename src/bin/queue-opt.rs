use clap::Parser;

use queue_opt::cli::{self, Cli};
use queue_opt::error::Result;

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let output = cli::run(cli)?;
    print!("{}", output);
    Ok(())
}
