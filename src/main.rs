//! schemadoc CLI entry point.

use clap::Parser;
use schemadoc::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log to stderr so JSON output on stdout stays clean. `-v` raises the
/// level; otherwise `RUST_LOG` applies, defaulting to warnings.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("schemadoc=warn")),
        1 => EnvFilter::new("schemadoc=debug"),
        _ => EnvFilter::new("schemadoc=trace"),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Generate(args) => match cli::run_generate(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
        Commands::List(args) => match cli::run_list(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
