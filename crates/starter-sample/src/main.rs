use starter_framework::{setup_tracing, BootError, StartController};
use starter_sample::connectors::MemoryDb;
use starter_sample::shop;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), BootError> {
    // Setup tracing once for the entire application
    setup_tracing();

    let controller = StartController::new();
    let system = shop::wire(&controller)?;

    controller.on_started("shop", |_ctx| {
        info!("shop component finished starting");
        Ok(())
    });

    let ctx = match controller.start().await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), "bootstrap failed");
            return Err(e);
        }
    };

    let db = ctx.must_get::<MemoryDb>("db.main")?;
    let settings = system.settings.lock().unwrap().clone();
    info!(
        db = %db.uri,
        connections = system.db_connector.built(),
        title = settings.map(|s| s.title).as_deref().unwrap_or("?"),
        "bootstrap finished, handing off to the application"
    );
    Ok(())
}
