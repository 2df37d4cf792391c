#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = entrex::run().await {
        eprintln!("entrex fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
