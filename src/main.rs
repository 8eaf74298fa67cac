//! Main entry point for the snaptar CLI app

use snaptar::archive;
use snaptar::cli::{self, Commands};
use snaptar::{logging, verify};
use tracing::{error, info};

fn main() -> std::process::ExitCode {
    let command = match cli::run() {
        Ok(command) => command,
        Err(e) => {
            // clap renders help, version and usage errors itself
            let _ = e.print();
            return if e.use_stderr() { std::process::ExitCode::FAILURE } else { std::process::ExitCode::SUCCESS };
        }
    };

    if let Err(e) = logging::init_logging(command.verbose()) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return std::process::ExitCode::FAILURE;
    }

    if run_app(&command) {
        std::process::ExitCode::SUCCESS
    } else {
        std::process::ExitCode::FAILURE
    }
}

/// Runs the command. Failures have already been logged when this returns false.
fn run_app(command: &Commands) -> bool {
    match command {
        Commands::Create(create) => {
            let Ok(result) = archive::run_backup(&create.request(), &create.options()) else {
                return false;
            };
            if create.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        error!("Error encoding result: {e}");
                        return false;
                    }
                }
            }
            true
        }
        Commands::Verify { archives } => {
            let mut ok = true;
            for path in archives {
                match verify::verify_archive(path) {
                    Ok(report) => info!(
                        "OK {} | crc {:08x} | {} entries | {} bytes",
                        report.path.display(),
                        report.checksum,
                        report.entries,
                        report.content_bytes
                    ),
                    Err(e) => {
                        error!("{e}");
                        ok = false;
                    }
                }
            }
            ok
        }
    }
}
