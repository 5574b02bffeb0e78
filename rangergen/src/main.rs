//! Ranger schema CLI

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use tracing::error;

mod commands;
mod hex;

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Flag for verbose output
const VERBOSE_FLAG: &str = "verbose";

fn schema_arg() -> Arg {
    Arg::new("schema")
        .long("schema")
        .required(true)
        .help("Path to YAML schema file")
        .value_parser(clap::value_parser!(PathBuf))
}

fn type_arg() -> Arg {
    Arg::new("type")
        .long("type")
        .required(true)
        .help("Name of a type declared in the schema")
        .value_parser(clap::value_parser!(String))
}

/// Entrypoint for the Ranger schema CLI
fn main() -> std::process::ExitCode {
    // Define application
    let matches = Command::new("rangergen")
        .version(crate_version())
        .about("Check schemas and sample or decode their encodings.")
        .arg(
            Arg::new(VERBOSE_FLAG)
                .short('v')
                .long(VERBOSE_FLAG)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new(commands::CHECK_CMD)
                .about("Load and validate a schema, then list its types with their minimum encoded size.")
                .arg(schema_arg()),
        )
        .subcommand(
            Command::new(commands::SAMPLE_CMD)
                .about("Generate random values of a type, verify they round-trip, and print their encodings as hex.")
                .arg(schema_arg())
                .arg(type_arg())
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("0")
                        .help("Seed for the random generator")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .default_value(commands::DEFAULT_COUNT)
                        .help("Number of values to generate (must be >= 1)")
                        .value_parser(clap::builder::RangedU64ValueParser::<usize>::new().range(1..)),
                ),
        )
        .subcommand(
            Command::new(commands::DECODE_CMD)
                .about("Unmarshal a hex-encoded value of a type and print it.")
                .arg(schema_arg())
                .arg(type_arg())
                .arg(
                    Arg::new("hex")
                        .long("hex")
                        .required(true)
                        .help("Hex-encoded input (whitespace and a 0x prefix are ignored)")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag(VERBOSE_FLAG) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // Parse subcommands
    match matches.subcommand() {
        Some((commands::CHECK_CMD, matches)) => {
            let schema_path = matches.get_one::<PathBuf>("schema").unwrap();
            if let Err(e) = commands::check(schema_path) {
                error!(error=?e, "failed to check schema");
            } else {
                return std::process::ExitCode::SUCCESS;
            }
        }
        Some((commands::SAMPLE_CMD, matches)) => {
            let schema_path = matches.get_one::<PathBuf>("schema").unwrap();
            let type_name = matches.get_one::<String>("type").unwrap();
            let seed = *matches.get_one::<u64>("seed").unwrap();
            let count = *matches.get_one::<usize>("count").unwrap();
            if let Err(e) = commands::sample(schema_path, type_name, seed, count) {
                error!(error=?e, "failed to sample values");
            } else {
                return std::process::ExitCode::SUCCESS;
            }
        }
        Some((commands::DECODE_CMD, matches)) => {
            let schema_path = matches.get_one::<PathBuf>("schema").unwrap();
            let type_name = matches.get_one::<String>("type").unwrap();
            let hex = matches.get_one::<String>("hex").unwrap();
            if let Err(e) = commands::decode(schema_path, type_name, hex) {
                error!(error=?e, "failed to decode value");
            } else {
                return std::process::ExitCode::SUCCESS;
            }
        }
        Some((cmd, _)) => {
            error!(cmd, "invalid subcommand");
        }
        None => {
            error!("no subcommand provided");
        }
    }
    std::process::ExitCode::FAILURE
}
