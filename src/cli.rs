use clap::{Arg, ArgMatches, Command};

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}

fn build_command() -> Command {
    Command::new("scanbench")
        .about("Memory scan orchestrator for the board test station")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to the TOML configuration file")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("station-url")
                .long("station-url")
                .short('s')
                .help("Override the station base URL from the config")
                .value_name("URL"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .help("Print the effective configuration as TOML and exit")
                .action(clap::ArgAction::SetTrue),
        )
}
