use slab_server::{Config, Server, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 可选
    dotenv::dotenv().ok();
    let config = Config::from_env();
    setup_environment(&config);
    tracing::info!(work_dir = %config.work_dir, printer = %config.printer, "Slab label server starting");

    if let Err(e) = Server::new(config).run().await {
        tracing::error!(error = %e, "Server exited with error");
        return Err(e.into());
    }
    Ok(())
}
