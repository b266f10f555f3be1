//! costcrab binary entry point.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    costcrab::cli::run().await
}
