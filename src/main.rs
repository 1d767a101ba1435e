use clap::Parser;

mod cli;
mod config;
mod error;
mod model;
mod parsers;
mod services;

fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    cli::run(cli::Cli::parse())
}
