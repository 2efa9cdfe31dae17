#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fintrack::tracing::init();
    fintrack::app::run().await
}
