#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tally_api::run().await
}
