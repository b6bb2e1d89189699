use clap::Parser;
use macross::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("macross"), log::LevelFilter::Info)
        .parse_default_env()
        .init();

    run(Cli::parse())
}
