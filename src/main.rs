use clap::Parser;
use mockswap::cli::{Cli, Commands};
use tracing::Level;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Rewrite { paths, dry_run, json, config } => {
            mockswap::cli::rewrite::run(paths, dry_run, json, config)
        }
        Commands::Check { paths, json, config } => {
            mockswap::cli::check::run(paths, json, config)
        }
        Commands::Schema { name } => {
            mockswap::cli::schema::run(&name)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
