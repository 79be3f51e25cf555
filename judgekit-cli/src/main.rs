use anyhow::Result;
use clap::Parser;
use judgekit_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    judgekit_cli::run(cli).await?;
    Ok(())
}
