use clap::Parser;
use icedrift_processor::cli::{run, Cli};
use icedrift_processor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
