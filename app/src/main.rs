use clap::Parser;
use std::process::ExitCode;
use tasklink_app::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    run(Cli::parse()).await.into()
}
