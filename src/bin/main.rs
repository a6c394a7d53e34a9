use clap::Parser;
use itemsubjector_rs::command_line::{command_line_usage, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    command_line_usage(cli).await?;
    Ok(())
}
