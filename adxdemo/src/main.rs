use std::fs::File;

use adx_axum::{openapi, start_server};
use adxdemo::{AppConfig, Cli, impls::DemoApp, routes, sweep};
use jwt_simple::prelude::HS256Key;
use time::OffsetDateTime;
use tokio::select;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // By convention, we leverage `tracing` to instrument and log various
    // operations throughout this project.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args and extract the JWT key
    let cli = Cli::import()?;
    let key = HS256Key::from_bytes(cli.secret.as_bytes());

    // Create config with proper layering of CLI args
    let AppConfig {
        server,
        exchange,
        sweeper,
        seed,
    } = AppConfig::load(&cli)?;

    // If requested, dump the schema and exit.
    if let Some(path) = cli.schema {
        let schema = openapi(routes::router());
        serde_json::to_writer_pretty(File::create(path)?, &schema)?;
        return Ok(());
    }

    let app = DemoApp::new(key, &exchange);
    seed.apply(&app)?;

    let shared = app.exchange.clone();
    let keeper = exchange.keeper();

    // We always run the server task.
    let server_task =
        tokio::spawn(async move { start_server(server, app, routes::router()).await });

    // However, we may or may not also sweep timed-out bids
    if sweeper.every.is_some() {
        let sweeper_task = tokio::spawn(async move {
            let f = async move |_: OffsetDateTime| {
                sweep(&shared, &keeper);
                Ok::<(), anyhow::Error>(())
            };
            sweeper.schedule(f).await
        });

        select! {
            r = server_task => r??,
            r = sweeper_task => r??,
        }
    } else {
        // Otherwise, we just run the server task to completion
        server_task.await??;
    }

    Ok(())
}
