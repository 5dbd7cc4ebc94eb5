use clap::Parser;
use health_export::HealthError;
use health_export::cli::{Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available, never resolve
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(HealthError::Interrupted {
                    reason: "Extraction interrupted by user".to_string(),
                }
                .into())
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Health Export - Apple Health XML Extractor");
    println!("==========================================");
    println!();
    println!("Extract per-category time series and the profile card from an");
    println!("Apple Health export.xml into CSV files and terminal summaries.");
    println!();
    println!("USAGE:");
    println!("    health_export <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    export      Write one CSV per category (main command)");
    println!("    profile     Show date of birth, sex, blood type, height and body mass");
    println!("    summary     Summarise every category over a date range");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose              Enable debug logging");
    println!("    -q, --quiet                Only log warnings and errors");
    println!("        --lenient              Skip malformed records instead of failing");
    println!("        --expect-offset <OFF>  Only accept timestamps with this UTC offset");
    println!("    -h, --help                 Show help information");
    println!("    -V, --version              Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Export all categories into ./download:");
    println!("    health_export export export.xml");
    println!();
    println!("    # Export into a custom directory, skipping malformed records:");
    println!("    health_export --lenient export export.xml --output /tmp/health");
    println!();
    println!("    # Show the profile card:");
    println!("    health_export profile export.xml");
    println!();
    println!("    # Summarise January 2020:");
    println!("    health_export summary export.xml --start 2020-01-01 --end 2020-02-01");
    println!();
    println!("For detailed help on any command, use:");
    println!("    health_export <COMMAND> --help");
}
