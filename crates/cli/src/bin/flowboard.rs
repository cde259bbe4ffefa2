use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    flowboard_cli::main_entry().await
}
