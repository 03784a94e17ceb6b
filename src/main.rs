use std::net::SocketAddr;
use std::sync::Arc;

use mock_exam_backend::{
    config::Config,
    database::{memory::MemoryExamStore, pool::create_pool, postgres::PgExamStore, store::ExamStore},
    router, AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    if config.gemini.has_api_key() {
        info!(model = %config.gemini.model, "GEMINI_API_KEY loaded");
    } else {
        warn!("GEMINI_API_KEY is not set; question generation and evaluation will fail until it is configured");
    }

    let store: Arc<dyn ExamStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            Arc::new(PgExamStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store, data is lost on restart");
            Arc::new(MemoryExamStore::new())
        }
    };

    let app_state = AppState::new(&config, store)?;
    let app = router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
