mod cli;

use clap::Parser;

fn main() {
    env_logger::init();
    cli::run(cli::Cli::parse());
}
