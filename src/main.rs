#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    subscribe_tracker::server::run().await
}
