#[tokio::main]
async fn main() -> anyhow::Result<()> {
    enrich_server::start().await
}
