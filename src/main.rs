// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use hookrelay::application::services::WebhookServices;
use hookrelay::config::settings::{Settings, StorageBackend};
use hookrelay::domain::services::webhook_service::WebhookSender;
use hookrelay::infrastructure::database::connection;
use hookrelay::infrastructure::services::webhook_service_impl::HttpWebhookSender;
use hookrelay::presentation::routes;
use hookrelay::utils::telemetry;
use hookrelay::workers::manager::{shutdown_signal, DispatcherPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.telemetry);
    info!("Starting hookrelay {}...", env!("CARGO_PKG_VERSION"));
    hookrelay::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Outbound transport
    let sender: Arc<dyn WebhookSender> = Arc::new(HttpWebhookSender::new(&settings.delivery)?);

    // 4. Storage
    let services = match settings.storage.backend {
        StorageBackend::Postgres => {
            let db = connection::connect_and_migrate(&settings.database).await?;
            info!("Database connection established");
            WebhookServices::with_database(Arc::new(db), sender, &settings)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, all data is lost on restart");
            WebhookServices::in_memory(sender, &settings)
        }
    };

    // 5. Start dispatchers and the stuck-claim reaper
    let mut pool = DispatcherPool::new(services.dispatcher());
    pool.start_workers(settings.delivery.workers.max(1));
    let reaper = services.claim_expiration_worker().start();

    // 6. Start HTTP server
    let app = routes::routes(&services);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 7. Drain in-flight deliveries
    reaper.abort();
    let grace = Duration::from_secs(settings.delivery.request_timeout_secs + 5);
    pool.shutdown(grace).await;

    info!("hookrelay stopped");
    Ok(())
}
